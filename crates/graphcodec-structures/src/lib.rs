//! The core crate for graphcodec. Defines the error taxonomy shared by every codec crate,
//! the limits applied to a single encode or decode pass, and the fixed-size math
//! aggregates that entities can store as primitive fields.

mod error;
mod limits;
pub mod math;

pub use error::{CodecError, CodecResult};
pub use limits::{CodecLimits, DEFAULT_FORMAT_VERSION};
pub use math::{Mat3, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
