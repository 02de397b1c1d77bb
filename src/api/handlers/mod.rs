pub mod health;
pub mod xform;
