//! Pure analyzers. None of them touch I/O or shared state; each is a
//! function of its input series.

pub mod alerts;
pub mod climate;
pub mod forest;
pub mod soc;
pub mod terrain;
pub mod vegetation;

pub use climate::Climatology;
