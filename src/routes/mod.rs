/// Router Module Index
///
/// Routes are grouped by access level. The auth gate is applied as a layer on
/// the authenticated router in `create_router`, so a protected endpoint cannot
/// be exposed by accident from the public module.

/// Routes open to any caller.
pub mod public;

/// Routes behind the cookie auth gate.
pub mod authenticated;
