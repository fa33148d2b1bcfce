//! # basin-dependence
//!
//! $$
//! (P_t, R_t)_{t=1}^n \mapsto \left(\rho_S,\ \tau,\ \chi_U,\ \chi_L,\ \hat C_\theta\right)
//! $$
//!
//! Rank correlation, tail dependence and copula selection between paired
//! precipitation and runoff series, one basin at a time.
//!
pub mod basin;
pub mod copulas;
pub mod logging;
