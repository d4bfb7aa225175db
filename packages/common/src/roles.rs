//! Well-known data roles.
//!
//! Roles are plain integers so applications can define their own above
//! [`USER`].

/// Role identifier type
pub type Role = i32;

/// Main value of the item
pub const DATA: Role = 1;
/// Human readable name
pub const DISPLAY: Role = 2;
/// Presentation hints (enabled/editable flags)
pub const APPEARANCE: Role = 3;
/// Numeric limits as a float array `[min, max]`
pub const LIMITS: Role = 4;
pub const TOOLTIP: Role = 5;
/// Name of the editor a projection should use for the value
pub const EDITOR_TYPE: Role = 6;
/// First role free for application use
pub const USER: Role = 256;
