//! # Copulas
//!
//! $$
//! C(u,v)=\mathbb P(U\le u,\,V\le v),\qquad U,V\sim\mathcal U(0,1)
//! $$
//!
pub mod bivariate;
pub mod correlation;
pub mod empirical;
pub mod error;
pub mod gof;
pub mod selection;
pub mod tail;

pub use bivariate::Bivariate;
pub use bivariate::Copula;
pub use bivariate::CopulaFamily;
pub use empirical::PseudoObservations;
pub use error::CopulaError;
