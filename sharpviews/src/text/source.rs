// Copyright 2025 the SharpViews Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;

use smallvec::SmallVec;

use super::{ClientRun, OrcInterpreter, TextRun, ORC, ORC_LEN};
use crate::boxes::BoxId;
use crate::style::AssembledStyles;

/// Where the rendered characters of a [`MapRun`] come from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOrigin {
    /// Text of a client run, rendered as is.
    Text,
    /// The expansion of an object replacement character at logical offset
    /// `orc`.
    OrcExpansion {
        /// Logical offset of the replaced character.
        orc: usize,
    },
    /// An embedded box.
    Embedded(BoxId),
}

/// A stretch of uniformly styled content, mapped between logical and
/// rendered offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct MapRun {
    /// Index of the client run this content belongs to.
    pub client_run: usize,
    /// Offset of the start of this run within its client run's text.
    pub client_offset: usize,
    /// Start in logical text.
    pub log_start: usize,
    /// Length in logical text.
    pub log_len: usize,
    /// Start in rendered text.
    pub ren_start: usize,
    /// Length in rendered text.
    pub ren_len: usize,
    /// Style of the content.
    pub style: AssembledStyles,
    /// Where the rendered characters come from.
    pub origin: RunOrigin,
}

impl MapRun {
    fn ren_end(&self) -> usize {
        self.ren_start + self.ren_len
    }

    fn log_end(&self) -> usize {
        self.log_start + self.log_len
    }

    fn is_empty(&self) -> bool {
        self.ren_len == 0 && self.log_len == 0
    }
}

/// A contiguous span of rendered text with uniform style.
///
/// Adjacent text of different client runs merges when the styles are the
/// same instance; an embedded box is always a run of its own.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRun {
    /// Start in rendered text.
    pub ren_start: usize,
    /// Length in rendered text.
    pub ren_len: usize,
    /// Style of the run.
    pub style: AssembledStyles,
    /// The embedded box this run stands for, if any.
    pub embedded: Option<BoxId>,
}

impl RenderRun {
    /// The rendered range covered by the run.
    pub fn range(&self) -> Range<usize> {
        self.ren_start..self.ren_start + self.ren_len
    }
}

/// The result of replacing one client run of a [`TextSource`].
///
/// Offsets are in rendered text: `delete_count` bytes starting at `start`
/// in the old source were replaced by `insert_count` bytes in the new one.
#[derive(Clone, Debug)]
pub struct SourceChange {
    /// First rendered offset that differs.
    pub start: usize,
    /// Number of rendered bytes removed.
    pub delete_count: usize,
    /// Number of rendered bytes inserted.
    pub insert_count: usize,
    /// The source after the change.
    pub new_source: TextSource,
}

impl SourceChange {
    /// Returns true if the rendered content did not change at all.
    pub fn is_empty(&self) -> bool {
        self.delete_count == 0 && self.insert_count == 0
    }
}

/// The content of a paragraph: an ordered list of client runs flattened into
/// one logical text stream and one rendered text stream.
///
/// Sources are immutable; [`TextSource::client_run_changed`] produces a new
/// source.
#[derive(Clone)]
pub struct TextSource {
    runs: Vec<ClientRun>,
    map: Vec<MapRun>,
    render_runs: Vec<RenderRun>,
    logical: String,
    rendered: String,
    interpreter: Option<OrcInterpreter>,
}

impl core::fmt::Debug for TextSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextSource")
            .field("logical", &self.logical)
            .field("rendered", &self.rendered)
            .field("map", &self.map)
            .field("has_interpreter", &self.interpreter.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for TextSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TextSource {
    /// Flattens `runs` without any interpretation of embedded characters.
    pub fn new(runs: Vec<ClientRun>) -> Self {
        Self::with_interpreter(runs, None)
    }

    /// Flattens `runs`, expanding object replacement characters found in text
    /// runs through `interpreter`.
    pub fn with_interpreter(runs: Vec<ClientRun>, interpreter: Option<OrcInterpreter>) -> Self {
        let mut builder = MapBuilder::default();
        for (index, run) in runs.iter().enumerate() {
            match run {
                ClientRun::Text(text) => builder.push_text_run(index, text, interpreter.as_ref()),
                ClientRun::Embedded(embedded) => {
                    builder.push_embedded(index, 0, &embedded.style, embedded.box_id);
                }
            }
        }
        let map = collapse_empty_runs(builder.map, &runs);
        let render_runs = merge_render_runs(&map);
        Self {
            runs,
            map,
            render_runs,
            logical: builder.logical,
            rendered: builder.rendered,
            interpreter,
        }
    }

    /// The client runs, in order.
    pub fn client_runs(&self) -> &[ClientRun] {
        &self.runs
    }

    /// The mapping from logical to rendered content.
    pub fn runs(&self) -> &[MapRun] {
        &self.map
    }

    /// The rendered content as runs of uniform style.
    pub fn render_runs(&self) -> &[RenderRun] {
        &self.render_runs
    }

    /// The ORC interpreter of this source, if any.
    pub fn interpreter(&self) -> Option<&OrcInterpreter> {
        self.interpreter.as_ref()
    }

    /// Length of the rendered text in bytes.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// Returns true if nothing is rendered.
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// Length of the logical text in bytes.
    pub fn logical_len(&self) -> usize {
        self.logical.len()
    }

    /// The logical text: client run texts concatenated, embedded boxes as
    /// [`ORC`].
    pub fn logical_text(&self) -> &str {
        &self.logical
    }

    /// The complete rendered text.
    pub fn rendered_text(&self) -> &str {
        &self.rendered
    }

    /// Rendered text in `min..lim`.
    pub fn fetch(&self, min: usize, lim: usize) -> &str {
        let lim = lim.min(self.rendered.len());
        &self.rendered[min.min(lim)..lim]
    }

    /// The style of the rendered character at `ich` and the range over which
    /// that style applies.
    pub fn char_props(&self, ich: usize) -> Option<(&AssembledStyles, Range<usize>)> {
        let run = self.render_run_at(ich)?;
        Some((&run.style, run.range()))
    }

    /// The render run containing `ich`; the last run for the end offset.
    ///
    /// Only a source without client runs has no render runs.
    pub fn render_run_at(&self, ich: usize) -> Option<&RenderRun> {
        self.render_runs
            .iter()
            .find(|run| ich < run.ren_start + run.ren_len)
            .or(self.render_runs.last())
    }

    /// Converts a logical offset to a rendered offset.
    pub fn log_to_ren(&self, log: usize) -> usize {
        let Some(run) = self.map.iter().find(|run| log < run.log_end()) else {
            return self.rendered.len();
        };
        match run.origin {
            RunOrigin::Text => run.ren_start + (log - run.log_start).min(run.ren_len),
            RunOrigin::OrcExpansion { .. } | RunOrigin::Embedded(_) => run.ren_start,
        }
    }

    /// Converts a rendered offset to a logical offset.
    ///
    /// Offsets strictly inside the expansion of an object replacement
    /// character map to the logical position of that character.
    pub fn ren_to_log(&self, ren: usize) -> usize {
        let Some(run) = self.map.iter().find(|run| ren < run.ren_end()) else {
            return self.logical.len();
        };
        match run.origin {
            RunOrigin::Text => run.log_start + (ren - run.ren_start).min(run.log_len),
            RunOrigin::OrcExpansion { orc } => orc,
            RunOrigin::Embedded(_) => run.log_start,
        }
    }

    /// The map run holding logical offset `log`.
    ///
    /// At a boundary between two runs `associate_previous` selects the run
    /// that ends there rather than the one that starts there.
    pub fn map_run_at_log(&self, log: usize, associate_previous: bool) -> Option<&MapRun> {
        let candidates: SmallVec<[&MapRun; 4]> = self
            .map
            .iter()
            .filter(|run| run.log_start <= log && log <= run.log_end())
            .collect();
        let preferred = if associate_previous {
            candidates
                .iter()
                .find(|run| run.log_len > 0 && run.log_end() == log)
        } else {
            candidates
                .iter()
                .find(|run| run.log_len > 0 && run.log_start == log)
        };
        preferred
            .or(candidates.iter().find(|run| run.log_start < log && log < run.log_end()))
            .or(candidates.first())
            .copied()
    }

    /// Logical start offset of each client run.
    pub fn client_run_starts(&self) -> Vec<usize> {
        let mut start = 0;
        self.runs
            .iter()
            .map(|run| {
                let s = start;
                start += run.logical_len();
                s
            })
            .collect()
    }

    /// The client runs touching logical offset `log`, as `(index, offset in
    /// run)`, ordered by preference: at a boundary the run on the side
    /// `associate_previous` selects comes first.
    pub fn client_runs_at(&self, log: usize, associate_previous: bool) -> SmallVec<[(usize, usize); 2]> {
        let mut found: SmallVec<[(usize, usize); 2]> = SmallVec::new();
        for (index, start) in self.client_run_starts().into_iter().enumerate() {
            let len = self.runs[index].logical_len();
            if start <= log && log <= start + len {
                found.push((index, log - start));
            }
        }
        if !associate_previous {
            found.reverse();
        }
        found
    }

    /// The style an insertion at logical offset `log` would take.
    pub fn style_at_log(&self, log: usize, associate_previous: bool) -> Option<AssembledStyles> {
        for (index, offset) in self.client_runs_at(log, associate_previous) {
            if let ClientRun::Text(run) = &self.runs[index] {
                return Some(run.style_at(offset, associate_previous).clone());
            }
        }
        self.render_run_at(self.log_to_ren(log))
            .map(|run| run.style.clone())
    }

    /// Builds the source that results from replacing client run `index` with
    /// `new_run`, together with the minimal rendered difference.
    ///
    /// Characters are compared with their style and origin, so a change of
    /// formatting, or an embedded character whose expansion happens to
    /// render like the text it replaced, counts as a change.
    pub fn client_run_changed(&self, index: usize, new_run: ClientRun) -> SourceChange {
        let mut runs = self.runs.clone();
        runs[index] = new_run;
        let new_source = Self::with_interpreter(runs, self.interpreter.clone());

        let old_span = self.rendered_span_of(index);
        let new_span = new_source.rendered_span_of(index);
        debug_assert_eq!(old_span.start, new_span.start, "runs before {index} changed");
        let old_keys = self.char_keys(old_span.clone());
        let new_keys = new_source.char_keys(new_span);

        let prefix = old_keys
            .iter()
            .zip(new_keys.iter())
            .take_while(|(a, b)| a == b)
            .count();
        let max_suffix = old_keys.len().min(new_keys.len()) - prefix;
        let suffix = old_keys
            .iter()
            .rev()
            .zip(new_keys.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let bytes = |keys: &[CharKey]| keys.iter().map(|k| k.ch.len_utf8()).sum::<usize>();
        let start = old_span.start + bytes(&old_keys[..prefix]);
        let delete_count = bytes(&old_keys[prefix..old_keys.len() - suffix]);
        let insert_count = bytes(&new_keys[prefix..new_keys.len() - suffix]);
        log::debug!(
            "client run {index} changed: start {start}, delete {delete_count}, insert {insert_count}"
        );
        SourceChange {
            start,
            delete_count,
            insert_count,
            new_source,
        }
    }

    fn rendered_span_of(&self, index: usize) -> Range<usize> {
        let mut span: Option<Range<usize>> = None;
        for run in self.map.iter().filter(|run| run.client_run == index) {
            span = Some(match span {
                Some(s) => s.start.min(run.ren_start)..s.end.max(run.ren_end()),
                None => run.ren_start..run.ren_end(),
            });
        }
        span.unwrap_or_else(|| {
            let at = self
                .map
                .iter()
                .find(|run| run.client_run > index)
                .map_or(self.rendered.len(), |run| run.ren_start);
            at..at
        })
    }

    fn char_keys(&self, span: Range<usize>) -> Vec<CharKey> {
        let mut keys = Vec::new();
        for run in &self.map {
            let lo = run.ren_start.max(span.start);
            let hi = run.ren_end().min(span.end);
            if lo >= hi {
                continue;
            }
            for ch in self.rendered[lo..hi].chars() {
                keys.push(CharKey {
                    ch,
                    style: run.style.clone(),
                    origin: run.origin,
                });
            }
        }
        keys
    }
}

#[derive(Clone, Debug)]
struct CharKey {
    ch: char,
    style: AssembledStyles,
    origin: RunOrigin,
}

impl PartialEq for CharKey {
    fn eq(&self, other: &Self) -> bool {
        self.ch == other.ch
            && AssembledStyles::ptr_eq(&self.style, &other.style)
            && core::mem::discriminant(&self.origin) == core::mem::discriminant(&other.origin)
            && match (self.origin, other.origin) {
                (RunOrigin::Embedded(a), RunOrigin::Embedded(b)) => a == b,
                _ => true,
            }
    }
}

#[derive(Default)]
struct MapBuilder {
    map: Vec<MapRun>,
    logical: String,
    rendered: String,
}

impl MapBuilder {
    fn push(
        &mut self,
        client_run: usize,
        client_offset: usize,
        log_len: usize,
        rendered: &str,
        style: &AssembledStyles,
        origin: RunOrigin,
    ) {
        self.map.push(MapRun {
            client_run,
            client_offset,
            log_start: self.logical.len(),
            log_len,
            ren_start: self.rendered.len(),
            ren_len: rendered.len(),
            style: style.clone(),
            origin,
        });
        self.rendered.push_str(rendered);
    }

    fn push_text_run(&mut self, index: usize, run: &TextRun, interpreter: Option<&OrcInterpreter>) {
        if run.is_empty() {
            self.push(index, 0, 0, "", run.first_style(), RunOrigin::Text);
            return;
        }
        for (range, style) in run.segments() {
            let segment = &run.text()[range.clone()];
            let mut piece_start = range.start;
            for (rel, _) in segment.match_indices(ORC) {
                let orc_at = range.start + rel;
                let expansion = interpreter.and_then(|interpret| interpret(run, orc_at));
                let Some(expansion) = expansion else {
                    continue;
                };
                self.push_plain(index, run, piece_start..orc_at, style);
                self.push_expansion(index, orc_at, style, &expansion);
                piece_start = orc_at + ORC_LEN;
            }
            self.push_plain(index, run, piece_start..range.end, style);
        }
    }

    fn push_plain(&mut self, index: usize, run: &TextRun, range: Range<usize>, style: &AssembledStyles) {
        if range.is_empty() {
            return;
        }
        let text = &run.text()[range.clone()];
        self.push(index, range.start, text.len(), text, style, RunOrigin::Text);
        self.logical.push_str(text);
    }

    fn push_expansion(&mut self, index: usize, orc_at: usize, style: &AssembledStyles, expansion: &ClientRun) {
        let orc = self.logical.len();
        match expansion {
            ClientRun::Text(text) => {
                let mut log_len = ORC_LEN;
                for (range, seg_style) in text.segments() {
                    let rendered = &text.text()[range];
                    self.push(index, orc_at, log_len, rendered, seg_style, RunOrigin::OrcExpansion { orc });
                    self.logical_advance(log_len);
                    log_len = 0;
                }
            }
            ClientRun::Embedded(embedded) => {
                self.push_embedded(index, orc_at, style, embedded.box_id);
            }
        }
    }

    fn push_embedded(&mut self, index: usize, client_offset: usize, style: &AssembledStyles, id: BoxId) {
        let mut orc = [0_u8; ORC_LEN];
        let orc: &str = ORC.encode_utf8(&mut orc);
        self.push(index, client_offset, ORC_LEN, orc, style, RunOrigin::Embedded(id));
        self.logical.push(ORC);
    }

    fn logical_advance(&mut self, log_len: usize) {
        if log_len > 0 {
            self.logical.push(ORC);
        }
    }
}

/// Drops empty map runs, except a single one when the source has no other
/// content, or one flanking an embedded box so that an insertion point can
/// be placed beside it.
fn collapse_empty_runs(map: Vec<MapRun>, runs: &[ClientRun]) -> Vec<MapRun> {
    let any_content = map.iter().any(|run| !run.is_empty());
    let next_to_box = |index: usize| {
        let embedded = |i: Option<usize>| {
            i.and_then(|i| runs.get(i))
                .is_some_and(|run| matches!(run, ClientRun::Embedded(_)))
        };
        embedded(index.checked_sub(1)) || embedded(index.checked_add(1))
    };
    let mut kept: Vec<MapRun> = Vec::with_capacity(map.len());
    for run in map {
        if run.is_empty() {
            let previous_empty = kept.last().is_some_and(MapRun::is_empty);
            let keep = if any_content {
                next_to_box(run.client_run) && !previous_empty
            } else {
                kept.is_empty()
            };
            if !keep {
                continue;
            }
        }
        kept.push(run);
    }
    kept
}

fn merge_render_runs(map: &[MapRun]) -> Vec<RenderRun> {
    let mut render_runs: Vec<RenderRun> = Vec::with_capacity(map.len());
    for run in map {
        let embedded = match run.origin {
            RunOrigin::Embedded(id) => Some(id),
            _ => None,
        };
        if let Some(last) = render_runs.last_mut() {
            if embedded.is_none()
                && last.embedded.is_none()
                && AssembledStyles::ptr_eq(&last.style, &run.style)
                && last.ren_start + last.ren_len == run.ren_start
            {
                last.ren_len += run.ren_len;
                continue;
            }
        }
        render_runs.push(RenderRun {
            ren_start: run.ren_start,
            ren_len: run.ren_len,
            style: run.style.clone(),
            embedded,
        });
    }
    render_runs
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::*;
    use crate::style::StyleCatalog;

    /// Runs `["", "ab\u{FFFC}c", "", "", "de"]`, the ORC expanding to "XYZ".
    fn expanding_source(style: &AssembledStyles) -> TextSource {
        let expansion = style.clone();
        let interpreter: OrcInterpreter = Rc::new(move |_: &TextRun, _: usize| {
            Some(ClientRun::Text(TextRun::new("XYZ", &expansion)))
        });
        let runs = ["", "ab\u{FFFC}c", "", "", "de"]
            .into_iter()
            .map(|text| ClientRun::Text(TextRun::new(text, style)))
            .collect();
        TextSource::with_interpreter(runs, Some(interpreter))
    }

    #[test]
    fn expansions_render_in_place_of_the_orc() {
        let style = StyleCatalog::new().default_style();
        let source = expanding_source(&style);
        assert_eq!(source.logical_text(), "ab\u{FFFC}cde");
        assert_eq!(source.rendered_text(), "abXYZcde");
        assert_eq!(source.fetch(1, 6), "bXYZc");

        // Offsets inside the expansion all belong to the ORC at 2.
        for ren in 2..5 {
            assert_eq!(source.ren_to_log(ren), 2, "rendered offset {ren}");
        }
        assert_eq!(source.log_to_ren(2), 2);
        assert_eq!(source.log_to_ren(5), 5, "the character after the ORC");
    }

    #[test]
    fn offsets_round_trip() {
        let style = StyleCatalog::new().default_style();
        let source = expanding_source(&style);
        for ren in (0..=source.len()).filter(|ren| !(3..5).contains(ren)) {
            assert_eq!(source.log_to_ren(source.ren_to_log(ren)), ren, "rendered offset {ren}");
        }
        let logical = source.logical_text();
        for log in (0..=logical.len()).filter(|&log| logical.is_char_boundary(log)) {
            assert_eq!(source.ren_to_log(source.log_to_ren(log)), log, "logical offset {log}");
        }
    }

    #[test]
    fn empty_runs_collapse() {
        let style = StyleCatalog::new().default_style();
        let source = expanding_source(&style);
        assert!(source.runs().iter().all(|run| !run.is_empty()), "{:?}", source.runs());
        let adjacent_empty = source
            .render_runs()
            .windows(2)
            .any(|pair| pair[0].ren_len == 0 && pair[1].ren_len == 0);
        assert!(!adjacent_empty, "{:?}", source.render_runs());

        let empty = TextSource::new(
            (0..3)
                .map(|_| ClientRun::Text(TextRun::new("", &style)))
                .collect(),
        );
        assert_eq!(empty.runs().len(), 1, "one run is kept for the formatting");
        assert_eq!(empty.render_runs().len(), 1);
        assert_eq!(empty.len(), 0);
    }

    #[test]
    fn replacing_a_run_with_itself_changes_nothing() {
        let style = StyleCatalog::new().default_style();
        let source = expanding_source(&style);
        for index in 0..source.client_runs().len() {
            let same = source.client_runs()[index].clone();
            let change = source.client_run_changed(index, same);
            assert!(change.is_empty(), "run {index}: {change:?}");
            assert_eq!(change.new_source.rendered_text(), source.rendered_text());
        }
    }

    #[test]
    fn changes_are_minimal() {
        let style = StyleCatalog::new().default_style();
        let source = expanding_source(&style);

        let typed = source.client_run_changed(4, ClientRun::Text(TextRun::new("dxe", &style)));
        assert_eq!((typed.start, typed.delete_count, typed.insert_count), (7, 0, 1));

        // Plain text that renders like the expansion still differs from it.
        let plain = source.client_run_changed(1, ClientRun::Text(TextRun::new("abXYZc", &style)));
        assert_eq!(plain.new_source.rendered_text(), source.rendered_text());
        assert_eq!((plain.start, plain.delete_count, plain.insert_count), (2, 3, 3));
    }
}
