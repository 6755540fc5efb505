// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Model Architecture
//!
//! Trait-based neuron models. Every model owns its conductances and is driven
//! one `timestep(dt)` at a time by an external harness.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `NeuronModel` (and `ModelParameters` for its parameters)
//! 3. Add tests
//! 4. Export in `mod.rs`

pub mod hodgkin_huxley;
pub mod lif;
pub mod traits;

// Re-export core types
pub use hodgkin_huxley::{
    fastest_gate_time_constant, GateRates, HhNeuron, HhParameters, IonicCurrents,
};
pub use lif::{LifNeuron, LifParameters};
pub use traits::{ModelParameters, NeuronModel};
