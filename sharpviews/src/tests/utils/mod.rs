// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod env;
mod site;

pub(crate) use env::{strings, TestEnv};
pub(crate) use site::{RecordingSite, SiteLog};
