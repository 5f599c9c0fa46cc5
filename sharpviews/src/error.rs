// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::boxes::BoxId;

/// Rich error type for layout, selection and editing operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus whatever context was available
/// when the operation failed: the box it was addressed to and the offending
/// offset with the length it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    box_id: Option<BoxId>,
    offset: Option<usize>,
    len: Option<usize>,
    detail: Option<&'static str>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The box the failing operation was addressed to, if any.
    pub fn box_id(&self) -> Option<BoxId> {
        self.box_id
    }

    /// The offending offset, if the error concerns a text position.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// The length the offset was checked against, if known.
    pub fn text_len(&self) -> Option<usize> {
        self.len
    }

    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            box_id: None,
            offset: None,
            len: None,
            detail: None,
        }
    }

    pub(crate) fn stale_box(id: BoxId) -> Self {
        Self {
            box_id: Some(id),
            ..Self::new(ErrorKind::StaleBox)
        }
    }

    pub(crate) fn not_laid_out(id: BoxId) -> Self {
        Self {
            box_id: Some(id),
            ..Self::new(ErrorKind::NotLaidOut)
        }
    }

    pub(crate) fn invalid_offset(id: BoxId, offset: usize, len: usize) -> Self {
        Self {
            box_id: Some(id),
            offset: Some(offset),
            len: Some(len),
            ..Self::new(ErrorKind::InvalidOffset)
        }
    }

    pub(crate) fn invalid_selection(detail: &'static str) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(ErrorKind::InvalidSelection)
        }
    }

    pub(crate) fn not_editable(id: BoxId, offset: usize) -> Self {
        Self {
            box_id: Some(id),
            offset: Some(offset),
            ..Self::new(ErrorKind::NotEditable)
        }
    }

    pub(crate) fn setter_frozen() -> Self {
        Self::new(ErrorKind::SetterFrozen)
    }

    pub(crate) fn unknown_style(detail: &'static str) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(ErrorKind::UnknownStyle)
        }
    }

    pub(crate) fn unsupported(detail: &'static str) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(ErrorKind::Unsupported)
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::StaleBox => write!(f, "box {:?} is no longer in the tree", self.box_id),
            ErrorKind::NotLaidOut => {
                write!(f, "box {:?} has not been laid out", self.box_id)
            }
            ErrorKind::InvalidOffset => write!(
                f,
                "offset {} out of bounds for len {} in box {:?}",
                self.offset.unwrap_or_default(),
                self.len.unwrap_or_default(),
                self.box_id
            ),
            ErrorKind::InvalidSelection => {
                write!(f, "invalid selection: {}", self.detail.unwrap_or("unknown"))
            }
            ErrorKind::NotEditable => write!(
                f,
                "text at offset {} in box {:?} is not editable",
                self.offset.unwrap_or_default(),
                self.box_id
            ),
            ErrorKind::SetterFrozen => {
                write!(f, "property setter has already been applied")
            }
            ErrorKind::UnknownStyle => {
                write!(f, "unknown style: {}", self.detail.unwrap_or("unnamed"))
            }
            ErrorKind::Unsupported => {
                write!(f, "unsupported operation: {}", self.detail.unwrap_or("unknown"))
            }
        }
    }
}

impl core::error::Error for Error {}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The box id does not refer to a live box.
    StaleBox,

    /// The operation needs a layout that has not been computed yet.
    NotLaidOut,

    /// A text offset was out of range for its paragraph.
    InvalidOffset,

    /// The selection does not describe a valid position or range.
    InvalidSelection,

    /// The text at the selection is not bound to editable data.
    NotEditable,

    /// A [`PropertySetter`](crate::style::PropertySetter) was modified after it was applied.
    SetterFrozen,

    /// A named style was requested that the stylesheet does not define.
    UnknownStyle,

    /// The operation is not supported at the current location.
    Unsupported,
}

/// Shorthand for results carrying an [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
