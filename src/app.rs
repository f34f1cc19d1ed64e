use anyhow::{Context, Result};

use crate::batch::{BatchCommand, HostRunner, WorkingCopy, chunks};
use crate::error::PathOpsError;
use crate::model::config::AppConfig;
use crate::model::document::{Document, Element, NodeKey};
use crate::model::options::{Options, Verb};
use crate::model::selection::{Ordered, Selection};
use crate::model::style::Style;
use crate::model::tagref;
use crate::model::units::unit_to_uu;
use crate::msg::Msg;

/// Result of one extension run.
#[derive(Debug)]
pub enum Outcome {
    /// Hand the input back as it was.
    Unchanged,
    /// The document after the batch run and reconciliation.
    Modified(Document),
}

/// One run of the path operations effect.
pub struct App<R: HostRunner> {
    pub config: AppConfig,
    pub options: Options,
    runner: R,
    pub notifications: Vec<Msg>,
}

impl<R: HostRunner> App<R> {
    pub fn new(config: AppConfig, options: Options, runner: R) -> Self {
        Self {
            config,
            options,
            runner,
            notifications: Vec::new(),
        }
    }

    /// Main entry point to process the current document.
    pub fn run(&mut self, mut doc: Document) -> Result<Outcome> {
        if tagref::has_tagrefs(&doc) {
            // unsafe to modify: Inkscape may crash on reload or close
            tracing::warn!("document uses selection sets, aborting");
            self.notify(Msg::SelectionSetsPresent);
            return Ok(Outcome::Unchanged);
        }

        let Some(ordered) = self.sorted_ids(&mut doc)? else {
            self.notify(Msg::InsufficientSelection);
            return Ok(Outcome::Unchanged);
        };

        tracing::info!(
            top = %ordered.top,
            others = ordered.others.len(),
            verb = %self.options.ink_verb,
            "selection flattened"
        );

        if self.options.dry_run {
            self.trace_dry_run(&ordered);
            return Ok(Outcome::Unchanged);
        }

        self.loop_pathops(&doc, &ordered)
    }

    #[cfg(test)]
    pub fn into_runner(self) -> R {
        self.runner
    }

    fn notify(&mut self, msg: Msg) {
        self.notifications.push(msg);
    }

    /// Collect eligible ids, patch styles as needed, and split off the top element.
    fn sorted_ids(&self, doc: &mut Document) -> Result<Option<Ordered>> {
        let selection = Selection::collect(doc, &self.options.ids, self.options.recursive_sel);
        tracing::debug!(
            selected = self.options.ids.len(),
            eligible = selection.len(),
            "selection collected"
        );

        let keys = selection.keys().to_vec();
        let ordered = selection.into_ordered(doc);
        if self.options.ink_verb == Verb::Cut && !self.options.dry_run && ordered.is_some() {
            self.default_strokes(doc, &keys)?;
        }

        Ok(ordered)
    }

    /// Cut Path works on strokes: give unstroked objects a visible one.
    fn default_strokes(&self, doc: &mut Document, keys: &[NodeKey]) -> Result<()> {
        let width = unit_to_uu(doc, &self.options.default_stroke_width)
            .context("converting --default_stroke_width")?
            .to_string();

        for key in keys {
            if let Some(el) = doc.element_mut(*key) {
                default_stroke(el, &self.options.default_stroke, &width);
            }
        }
        Ok(())
    }

    fn trace_dry_run(&mut self, ordered: &Ordered) {
        let chunk_size = self.options.chunk_size();
        let workfile = WorkingCopy::path_for(&self.options.document, &self.config.workfile.suffix);
        let program = self.config.host_binary();

        self.notify(Msg::TopObject(ordered.top.clone()));
        self.notify(Msg::OthersTotal(ordered.others.len()));

        let mut count = 0;
        for chunk in chunks(&ordered.others, chunk_size) {
            count += 1;
            self.notify(Msg::ChunkStart {
                index: count,
                objects: chunk.len(),
            });
            let command = BatchCommand::path_ops(
                &program,
                &workfile,
                &ordered.top,
                chunk,
                self.options.ink_verb,
            );
            self.notify(Msg::Command(command.to_string()));
        }

        self.notify(Msg::Summary {
            chunks: count,
            objects: ordered.others.len(),
        });
    }

    /// Write the working copy, run every chunk through the host, then reload and reconcile.
    fn loop_pathops(&mut self, doc: &Document, ordered: &Ordered) -> Result<Outcome> {
        let chunk_size = self.options.chunk_size();
        let program = self.config.host_binary();
        let copy = WorkingCopy::create(&self.options.document, &self.config.workfile.suffix, doc)
            .context("writing working copy")?;

        for (idx, chunk) in chunks(&ordered.others, chunk_size).enumerate() {
            tracing::info!(chunk = idx + 1, objects = chunk.len(), "running host batch");
            let command = BatchCommand::path_ops(
                &program,
                copy.path(),
                &ordered.top,
                chunk,
                self.options.ink_verb,
            );

            match self.runner.run(&command) {
                Ok(()) => {}
                Err(PathOpsError::Process(stderr)) => {
                    tracing::error!(chunk = idx + 1, "host batch failed, aborting run");
                    self.notify(Msg::ProcessFailed(stderr));
                    return Ok(Outcome::Unchanged);
                }
                Err(other) => return Err(other.into()),
            }
        }

        let mut result = copy.load().context("reloading working copy")?;

        if !self.options.keep_top {
            if let Some(top) = result.get_element_by_id(&ordered.top) {
                result.remove(top);
                tracing::info!(id = %ordered.top, "top element removed");
            }
        }

        let report = tagref::repair(&mut result, self.config.tagrefs.mode);
        if !report.is_empty() {
            tracing::info!(
                purged = report.purged.len(),
                placeholders = report.placeholders.len(),
                "selection set references repaired"
            );
        }

        Ok(Outcome::Modified(result))
    }
}

/// Default `stroke` and `stroke-width` of `el`, preferring its own fill color.
fn default_stroke(el: &mut Element, default_color: &str, default_width: &str) {
    let mut style = Style::parse(el.attr(None, "style"));

    let stroke_color = style
        .get("fill")
        .filter(|fill| !fill.is_empty() && *fill != "none" && !fill.starts_with("url("))
        .unwrap_or(default_color)
        .to_string();

    if style.get("stroke").is_none_or(|stroke| stroke == "none") {
        style.set("stroke", stroke_color.as_str());
    }
    if el.attr(None, "stroke") == Some("none") {
        el.set_attr("stroke", stroke_color.as_str());
    }
    if !style.contains("stroke-width") {
        style.set("stroke-width", default_width);
    }

    el.set_attr("style", style.to_string());
}
