//! Unit and behavioural coverage for the CLI runtime.

mod behaviour;
mod support;
