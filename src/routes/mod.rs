/// Router Module Index
///
/// Splits routes by access level so authentication is applied per router layer.

/// Routes accessible to anonymous clients.
pub mod public;

/// Routes behind the `AuthUser` authentication layer.
pub mod authenticated;
