// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for kinswarm CLI

pub mod config;
pub mod plan;
pub mod team;

pub use self::config::ConfigCommand;
pub use self::plan::PlanCommand;
pub use self::team::TeamCommand;
