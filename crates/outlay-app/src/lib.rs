// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod controller;
pub mod forms;
pub mod gateway;
pub mod ids;
pub mod model;

pub use controller::*;
pub use forms::*;
pub use gateway::*;
pub use ids::*;
pub use model::*;
