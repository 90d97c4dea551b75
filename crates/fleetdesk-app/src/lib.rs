// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod columns;
pub mod controller;
pub mod debounce;
pub mod forms;
pub mod ids;
pub mod loader;
pub mod model;
pub mod sort;
pub mod store;

pub use columns::*;
pub use controller::*;
pub use debounce::*;
pub use forms::*;
pub use ids::*;
pub use loader::*;
pub use model::*;
pub use sort::*;
pub use store::*;
