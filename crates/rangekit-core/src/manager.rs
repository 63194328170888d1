//! Named-range lifecycle over a host document.
//!
//! [`NameManager`] is the only place where the compiler, the tag codec and
//! the host meet: it turns a selection or typed reference into a
//! `(name, formula, comment)` payload, persists it, and reclassifies stored
//! names on every listing.

use log::{debug, info, warn};
use serde::Serialize;

use crate::error::{RangekitError, Result};
use crate::host::{HostDocument, NamedRangeRecord, SavePayload, Scope, name_key};
use crate::tags::{CommentTags, OverflowMap, compose_comment, strip_tags};
use rangekit_engine::engine::{
    CompiledRange, CompilerOptions, FormulaCompiler, Health, Promotion, RangeType,
    SelectionGrid, classify_health, detect_range_type, validate_name,
};

/// What the user asked for when saving a name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DefineRequest {
    pub name: String,
    /// Free text shown next to the name; any tags in it are dropped.
    pub description: String,
    pub options: CompilerOptions,
    /// `None` uses the manager's default scope.
    pub scope: Option<Scope>,
}

impl DefineRequest {
    pub fn new(name: impl Into<String>) -> Self {
        DefineRequest {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Where a redefined name takes its range from.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeSource {
    /// A fresh pick, possibly with skips.
    Selection(SelectionGrid),
    /// A typed reference.
    Reference(String),
    /// The range recorded in the name's own tags, or its current formula.
    Stored,
}

/// A stored name with everything derived from it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NamedRangeView {
    pub record: NamedRangeRecord,
    pub description: String,
    pub tags: CommentTags,
    /// Created by rangekit.
    pub origin: bool,
    pub range_type: RangeType,
    pub health: Health,
}

impl NamedRangeView {
    pub fn from_record(record: NamedRangeRecord) -> Self {
        let tags = CommentTags::decode(&record.comment);
        let health = classify_health(
            &record.formula,
            &record.resolved_value,
            record.resolved_address.as_deref(),
        );
        NamedRangeView {
            description: strip_tags(&record.comment),
            origin: tags.origin,
            range_type: detect_range_type(&record.formula),
            health,
            tags,
            record,
        }
    }
}

pub struct NameManager<H: HostDocument> {
    host: H,
    compiler: FormulaCompiler,
    default_scope: Scope,
}

impl<H: HostDocument> NameManager<H> {
    pub fn new(host: H, compiler: FormulaCompiler) -> Self {
        NameManager {
            host,
            compiler,
            default_scope: Scope::Document,
        }
    }

    pub fn with_default_scope(mut self, scope: Scope) -> Self {
        self.default_scope = scope;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn compiler(&self) -> &FormulaCompiler {
        &self.compiler
    }

    /// Check that `name` is a legal identifier not used by another name.
    ///
    /// `current` is the name being edited, which may keep its own identifier.
    pub fn check_name(&self, name: &str, current: Option<&str>) -> Result<()> {
        validate_name(name)?;
        let renaming = current.is_none_or(|c| name_key(c) != name_key(name));
        if renaming && self.find(name)?.is_some() {
            return Err(RangekitError::NameExists(name.to_string()));
        }
        Ok(())
    }

    /// Compile without saving anything.
    pub fn preview(&self, grid: &SelectionGrid, options: &CompilerOptions) -> Result<CompiledRange> {
        Ok(self.compiler.compile_selection(grid, options)?)
    }

    /// Save a new name over a selection grid.
    ///
    /// Overflow flags are taken from the host's selection snapshot when it
    /// covers the same range as `grid`.
    pub fn define_from_selection(
        &mut self,
        request: &DefineRequest,
        grid: &SelectionGrid,
    ) -> Result<SavePayload> {
        self.check_name(&request.name, None)?;
        let _edit = self.host.begin_edit(&request.name)?;
        let (formula, tags) = self.compile_grid(grid, &request.options)?;
        let payload = self.payload(request, formula, &tags);
        self.host.create(&payload)?;
        info!("defined {} as {}", payload.name, payload.formula);
        Ok(payload)
    }

    /// Save a new name over a typed reference.
    ///
    /// A reference that does not parse is saved as typed.
    pub fn define_from_reference(
        &mut self,
        request: &DefineRequest,
        reference: &str,
    ) -> Result<SavePayload> {
        self.check_name(&request.name, None)?;
        let _edit = self.host.begin_edit(&request.name)?;
        let (formula, tags) = self.promote(reference, &request.options)?;
        let payload = self.payload(request, formula, &tags);
        self.host.create(&payload)?;
        info!("defined {} as {}", payload.name, payload.formula);
        Ok(payload)
    }

    /// Recompile and/or rename an existing name.
    pub fn redefine(
        &mut self,
        original_name: &str,
        request: &DefineRequest,
        source: &RangeSource,
    ) -> Result<SavePayload> {
        let _edit = self.host.begin_edit(original_name)?;
        let existing = self
            .find(original_name)?
            .ok_or_else(|| RangekitError::NameNotFound(original_name.to_string()))?;
        self.check_name(&request.name, Some(original_name))?;

        let (formula, tags) = match source {
            RangeSource::Selection(grid) => self.compile_grid(grid, &request.options)?,
            RangeSource::Reference(reference) => self.promote(reference, &request.options)?,
            RangeSource::Stored => {
                let stored = CommentTags::decode(&existing.comment);
                match stored.selection_grid() {
                    Some(grid) => self.compile_grid(&grid, &request.options)?,
                    None => self.promote(&existing.formula, &request.options)?,
                }
            }
        };

        let mut payload = self.payload(request, formula, &tags);
        if request.scope.is_none() {
            payload.scope = existing.scope.clone();
        }
        self.host.update(&existing.name, &payload)?;
        info!("redefined {} as {}", original_name, payload.name);
        Ok(payload)
    }

    /// Give a name a new identifier, keeping its formula and comment.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<SavePayload> {
        let _edit = self.host.begin_edit(old_name)?;
        let existing = self
            .find(old_name)?
            .ok_or_else(|| RangekitError::NameNotFound(old_name.to_string()))?;
        self.check_name(new_name, Some(old_name))?;
        let payload = SavePayload {
            name: new_name.to_string(),
            formula: existing.formula,
            comment: existing.comment,
            scope: existing.scope,
        };
        self.host.update(&existing.name, &payload)?;
        info!("renamed {} to {}", old_name, new_name);
        Ok(payload)
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let _edit = self.host.begin_edit(name)?;
        self.host.delete(name)
    }

    /// Delete every broken name, returning the names removed.
    pub fn remove_broken(&mut self) -> Result<Vec<String>> {
        let broken: Vec<String> = self
            .list()?
            .into_iter()
            .filter(|view| view.health == Health::Broken)
            .map(|view| view.record.name)
            .collect();
        for name in &broken {
            self.remove(name)?;
        }
        if !broken.is_empty() {
            warn!("removed {} broken names", broken.len());
        }
        Ok(broken)
    }

    pub fn list(&self) -> Result<Vec<NamedRangeView>> {
        Ok(self
            .host
            .names()?
            .into_iter()
            .map(NamedRangeView::from_record)
            .collect())
    }

    pub fn get(&self, name: &str) -> Result<NamedRangeView> {
        self.find(name)?
            .map(NamedRangeView::from_record)
            .ok_or_else(|| RangekitError::NameNotFound(name.to_string()))
    }

    fn find(&self, name: &str) -> Result<Option<NamedRangeRecord>> {
        let key = name_key(name);
        Ok(self
            .host
            .names()?
            .into_iter()
            .find(|record| name_key(&record.name) == key))
    }

    fn compile_grid(
        &self,
        grid: &SelectionGrid,
        options: &CompilerOptions,
    ) -> Result<(String, CommentTags)> {
        let compiled = self.compiler.compile_selection(grid, options)?;
        let mut tags = CommentTags::from_compiled(&compiled);
        let (col_overflow, row_overflow) = self.overflow_for(grid);
        tags.col_overflow = col_overflow;
        tags.row_overflow = row_overflow;
        Ok((compiled.formula, tags))
    }

    fn promote(&self, reference: &str, options: &CompilerOptions) -> Result<(String, CommentTags)> {
        Ok(match self.compiler.promote_reference(reference, options)? {
            Promotion::Compiled(compiled) => {
                let tags = CommentTags::from_compiled(&compiled);
                (compiled.formula, tags)
            }
            Promotion::PassThrough(formula) => (
                formula,
                CommentTags {
                    origin: true,
                    ..Default::default()
                },
            ),
        })
    }

    fn overflow_for(&self, grid: &SelectionGrid) -> (OverflowMap, OverflowMap) {
        let Ok(snapshot) = self.host.selection() else {
            return Default::default();
        };
        match snapshot.range() {
            Ok(range) if range == grid.range => {
                (snapshot.column_overflow, snapshot.row_overflow)
            }
            _ => {
                debug!("selection snapshot does not match grid, no overflow flags");
                Default::default()
            }
        }
    }

    fn payload(&self, request: &DefineRequest, formula: String, tags: &CommentTags) -> SavePayload {
        SavePayload {
            name: request.name.trim().to_string(),
            formula,
            comment: compose_comment(tags, &request.description),
            scope: request
                .scope
                .clone()
                .unwrap_or_else(|| self.default_scope.clone()),
        }
    }
}
