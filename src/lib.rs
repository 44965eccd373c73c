//! Application-wide command registry and dispatch engine.
//!
//! Feature modules register [`descriptor::CommandDescriptor`]s with a shared
//! [`registry::CommandRegistry`]. Menus, the toolbar, the command palette, the
//! key handler, the command bus and the HTTP bridge all list commands through
//! [`registry::catalog`] and run them through [`dispatcher::Dispatcher`].

#[cfg(feature = "http-api")]
pub mod api;
pub mod bus;
pub mod context;
pub mod demo;
pub mod descriptor;
pub mod dispatcher;
pub mod editor;
pub mod error;
pub mod events;
pub mod keymap;
pub mod logging;
pub mod paths;
pub mod persist;
pub mod registry;
pub mod settings;
pub mod state;
pub mod workbench;
