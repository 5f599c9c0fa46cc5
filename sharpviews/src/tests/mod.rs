// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_layout;
mod test_lazy;
mod test_selection;
mod test_sequence;
mod utils;
