// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph content: strings, client runs, and their flattening into a
//! rendered character stream.

pub(crate) mod chars;
mod client_run;
mod rich;
mod source;

pub use self::client_run::{ClientRun, EmbeddedRun, OrcInterpreter, TextRun};
pub use self::rich::{MultiString, RichString};
pub use self::source::{MapRun, RenderRun, RunOrigin, SourceChange, TextSource};

/// The object replacement character, standing for an embedded object.
pub const ORC: char = '\u{FFFC}';

/// Length in bytes of [`ORC`].
pub const ORC_LEN: usize = ORC.len_utf8();
