pub mod interp;
pub mod quadrature;
