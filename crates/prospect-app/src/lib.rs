// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod actions;
pub mod attachment;
pub mod model;
pub mod policy;
pub mod session;
pub mod state;
pub mod status;
pub mod template;
pub mod transfer;
pub mod wire;

pub use actions::*;
pub use attachment::*;
pub use model::*;
pub use policy::*;
pub use session::*;
pub use state::*;
pub use status::*;
pub use template::*;
pub use transfer::*;
pub use wire::*;
