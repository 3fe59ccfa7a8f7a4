pub mod remotive;
