//! Render orchestrator: walks the schema tree and drives the mount tree.
//!
//! The [`Interpreter`] normalizes its input, merges the context, builds the
//! action table, and walks Container → Row → Column → content → Component,
//! delegating to the condition gate, the repeater reconciler, the binding
//! resolver, and the action dispatcher. Component leaves are instantiated
//! through the [`ComponentHost`] collaborator; unknown type tags become
//! visible placeholder nodes rather than aborting the tree.
//!
//! Structural chrome (containers, rows, columns outside repeats) is rebuilt
//! on every pass. Repeat-tracked instances survive across passes: kept keys
//! are reparented into the fresh structure in collection order and rebound
//! in place, so reordering a key moves its instance rather than recreating
//! it.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use slotmap::SecondaryMap;
use tracing::warn;

use crate::action::{ActionDispatcher, EmittedEvent, Router, SubmitHook, UiEvent};
use crate::bind::{self, wire_value_back};
use crate::context::Context;
use crate::eval::{evaluate, truthy_opt};
use crate::gate::should_render;
use crate::host::{headless_registry, ComponentHost, WidgetInstance};
use crate::mount::{MountData, MountId, MountKind, MountTree};
use crate::repeat::{item_key, overlay_scope, KeyToken, KeyedEntry, KeyedState, ResolvedRepeat};
use crate::schema::{
    ActionTrigger, Column, Component, Container, Document, LayoutNode, Repeat, Row, SchemaError,
};

/// Translator collaborator: resolves an i18n key into display text.
pub type TranslateFn = Box<dyn Fn(&str) -> String>;

// ---------------------------------------------------------------------------
// Phase / RenderReport
// ---------------------------------------------------------------------------

/// Lifecycle state of one interpreter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No render attempted yet.
    Idle,
    /// Normalizing input and merging context.
    Resolving,
    /// Walking the schema tree.
    Rendering,
    /// Last render completed.
    Rendered,
    /// Last render aborted; output is the previous good tree.
    Error,
}

/// Counters for one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Widgets instantiated this pass.
    pub components: usize,
    /// Repeat instances kept and rebound instead of recreated.
    pub reused: usize,
    /// Component nodes whose type tag the host rejected.
    pub unsupported: usize,
    /// Items cut from instantiation by virtualization.
    pub truncated: usize,
}

// ---------------------------------------------------------------------------
// Internal walk types
// ---------------------------------------------------------------------------

/// The repeat-bearing node kinds a reconcile pass can target.
#[derive(Clone, Copy)]
enum RepeatTarget<'a> {
    Row(&'a Row),
    Column(&'a Column),
    Component(&'a Component),
}

/// Triggers wired to one mounted component, with the scope its bindings
/// last saw (item overlays included for repeated instances).
struct TriggerSeat {
    triggers: Vec<ActionTrigger>,
    base_scope: Value,
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

/// The embeddable layout interpreter.
///
/// One instance owns one context, one mount tree, and one action
/// dispatcher. Collaborators (router, translator, submit hook) attach with
/// builder-style setters.
pub struct Interpreter {
    host: Box<dyn ComponentHost>,
    tree: MountTree,
    context: Context,
    dispatcher: ActionDispatcher,
    translate: Option<TranslateFn>,
    debug: bool,
    phase: Phase,
    last_error: Option<String>,
    document: Option<Document>,
    repeats: HashMap<String, KeyedState>,
    visited_sites: HashSet<String>,
    triggers: SecondaryMap<MountId, TriggerSeat>,
    report: RenderReport,
}

impl Interpreter {
    /// Create an interpreter over the given component host.
    pub fn new(host: Box<dyn ComponentHost>) -> Self {
        Self {
            host,
            tree: MountTree::new(),
            context: Context::new(),
            dispatcher: ActionDispatcher::new(),
            translate: None,
            debug: false,
            phase: Phase::Idle,
            last_error: None,
            document: None,
            repeats: HashMap::new(),
            visited_sites: HashSet::new(),
            triggers: SecondaryMap::new(),
            report: RenderReport::default(),
        }
    }

    /// Create an interpreter over the built-in headless widget registry.
    pub fn headless() -> Self {
        Self::new(Box::new(headless_registry()))
    }

    /// Attach the router collaborator (builder).
    pub fn with_router(mut self, router: Box<dyn Router>) -> Self {
        self.dispatcher.set_router(router);
        self
    }

    /// Attach the translator collaborator (builder).
    pub fn with_translator(mut self, translate: impl Fn(&str) -> String + 'static) -> Self {
        self.translate = Some(Box::new(translate));
        self
    }

    /// Attach the submit collaborator (builder).
    pub fn with_submit_hook(mut self, hook: SubmitHook) -> Self {
        self.dispatcher.set_submit_hook(hook);
        self
    }

    /// Enable debug warnings and inline error detail (builder).
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.dispatcher.set_debug(debug);
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    /// The mounted output tree.
    pub fn tree(&self) -> &MountTree {
        &self.tree
    }

    /// The live context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The action dispatcher.
    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Mutable access to the action dispatcher (flush, drain, collaborators).
    pub fn dispatcher_mut(&mut self) -> &mut ActionDispatcher {
        &mut self.dispatcher
    }

    /// Drain events emitted by `emit` actions since the last drain.
    pub fn drain_emitted(&mut self) -> Vec<EmittedEvent> {
        self.dispatcher.drain_emitted()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Error message captured by the last failed render, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Counters from the last completed pass.
    pub fn report(&self) -> RenderReport {
        self.report
    }

    /// Downcast a mounted component's widget.
    pub fn widget_as<T: 'static>(&self, mount: MountId) -> Option<&T> {
        self.tree
            .get(mount)?
            .widget
            .as_ref()?
            .as_any()
            .downcast_ref()
    }

    /// Mutably downcast a mounted component's widget.
    pub fn widget_as_mut<T: 'static>(&mut self, mount: MountId) -> Option<&mut T> {
        self.tree
            .get_mut(mount)?
            .widget
            .as_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    // ── Rendering entry points ───────────────────────────────────────

    /// Render a schema supplied as JSON text.
    ///
    /// A parse or shape failure aborts only this render: the previous
    /// output is untouched and the error message is captured.
    pub fn render_json(&mut self, json: &str, external: Value) -> Result<(), SchemaError> {
        self.phase = Phase::Resolving;
        match Document::from_json(json) {
            Ok(doc) => self.render_document(doc, external),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Render a schema supplied as a loose JSON value (full document or
    /// bare container).
    pub fn render_value(&mut self, schema: Value, external: Value) -> Result<(), SchemaError> {
        self.phase = Phase::Resolving;
        match Document::from_value(schema) {
            Ok(doc) => self.render_document(doc, external),
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    /// Render a normalized document.
    ///
    /// The context is replaced in place with `contextDefaults` overlaid by
    /// `external`, and the action table is rebuilt from the document.
    pub fn render_document(&mut self, doc: Document, external: Value) -> Result<(), SchemaError> {
        self.phase = Phase::Resolving;
        self.last_error = None;
        self.context.reset(&doc.context_defaults, external);
        self.dispatcher.set_table(&doc.actions);
        self.document = Some(doc);
        self.render_pass();
        Ok(())
    }

    /// Shallow-merge a patch into the live context and re-render.
    ///
    /// This is the only partial-update entry point; it currently re-walks
    /// the whole tree rather than rebinding only affected nodes.
    pub fn update_context(&mut self, patch: Value) {
        self.context.merge(patch);
        if self.document.is_some() {
            self.phase = Phase::Resolving;
            self.render_pass();
        }
    }

    /// Deliver a UI event to a mounted component's triggers.
    ///
    /// Returns whether any trigger matched the event name.
    pub fn fire(&mut self, mount: MountId, event: &mut UiEvent) -> bool {
        let Some(seat) = self.triggers.get(mount) else {
            return false;
        };
        let matched: Vec<ActionTrigger> = seat
            .triggers
            .iter()
            .filter(|trigger| trigger.event == event.name)
            .cloned()
            .collect();
        if matched.is_empty() {
            return false;
        }
        let base = seat.base_scope.clone();
        for trigger in matched {
            let scope = self.fire_scope(&base);
            self.dispatcher.fire(&trigger, event, scope);
        }
        true
    }

    /// The scope an action sees: the node's last bound scope refreshed
    /// with the current top-level context entries.
    fn fire_scope(&self, base: &Value) -> Value {
        let mut scope = base.clone();
        if let (Value::Object(target), Value::Object(current)) =
            (&mut scope, self.context.snapshot())
        {
            for (key, value) in current {
                target.insert(key, value);
            }
        }
        scope
    }

    fn fail(&mut self, err: &SchemaError) {
        self.last_error = Some(err.to_string());
        self.phase = Phase::Error;
        if self.debug {
            warn!(%err, "render aborted");
        }
    }

    // ── Render pass ──────────────────────────────────────────────────

    fn render_pass(&mut self) {
        let Some(doc) = self.document.clone() else {
            return;
        };
        self.phase = Phase::Rendering;
        self.report = RenderReport::default();
        self.visited_sites.clear();

        let scope = self.context.snapshot();
        let old_root = self.tree.root();
        self.tree.set_root(None);

        let new_root = if should_render(doc.root.visible.as_ref(), None, &scope) {
            Some(self.mount_container(&doc.root, &scope, None, ""))
        } else {
            None
        };

        // Repeat sites the pass never reached lost their governing node;
        // their tracked instances go with it.
        let stale: Vec<String> = self
            .repeats
            .keys()
            .filter(|site| !self.visited_sites.contains(*site))
            .cloned()
            .collect();
        for site in stale {
            if let Some(state) = self.repeats.remove(&site) {
                for entry in state.entries() {
                    self.destroy_subtree(entry.mount);
                }
            }
        }

        // Kept repeat instances were reparented out of the old tree during
        // the walk; whatever remains under the old root is gone for good.
        if let Some(old) = old_root {
            self.destroy_subtree(old);
        }

        self.tree.set_root(new_root);
        self.phase = Phase::Rendered;
    }

    fn destroy_subtree(&mut self, id: MountId) {
        let removed = self.tree.remove(id);
        if removed.is_empty() {
            return;
        }
        let ids: Vec<MountId> = removed.iter().map(|(id, _)| *id).collect();
        for (removed_id, mut data) in removed {
            data.teardown();
            self.triggers.remove(removed_id);
        }
        for state in self.repeats.values_mut() {
            state.purge_mounts(&ids);
        }
    }

    // ── Structural mounting ──────────────────────────────────────────

    fn mount_container(
        &mut self,
        container: &Container,
        scope: &Value,
        parent: Option<MountId>,
        site: &str,
    ) -> MountId {
        let data = MountData::new(MountKind::Container {
            title: container.title.clone(),
        })
        .with_class_str(container.class.as_deref());
        let id = match parent {
            Some(parent) => self.tree.insert_child(parent, data),
            None => self.tree.insert(data),
        };
        for (index, row) in container.rows.iter().enumerate() {
            self.render_row(row, scope, id, &join_site(site, "r", index));
        }
        id
    }

    fn render_row(&mut self, row: &Row, scope: &Value, parent: MountId, site: &str) {
        if row.repeat.is_active() {
            self.reconcile(RepeatTarget::Row(row), &row.repeat, scope, parent, site);
            return;
        }
        if !should_render(row.visible.as_ref(), None, scope) {
            return;
        }
        self.mount_row(row, scope, parent, site);
    }

    fn mount_row(&mut self, row: &Row, scope: &Value, parent: MountId, site: &str) -> MountId {
        let data = MountData::new(MountKind::Row).with_class_str(row.class.as_deref());
        let id = self.tree.insert_child(parent, data);
        for (index, column) in row.columns.iter().enumerate() {
            self.render_column(column, scope, id, &join_site(site, "c", index));
        }
        id
    }

    fn render_column(&mut self, column: &Column, scope: &Value, parent: MountId, site: &str) {
        if column.repeat.is_active() {
            self.reconcile(
                RepeatTarget::Column(column),
                &column.repeat,
                scope,
                parent,
                site,
            );
            return;
        }
        if !should_render(column.visible.as_ref(), None, scope) {
            return;
        }
        self.mount_column(column, scope, parent, site);
    }

    fn mount_column(
        &mut self,
        column: &Column,
        scope: &Value,
        parent: MountId,
        site: &str,
    ) -> MountId {
        let data = MountData::new(MountKind::Column {
            span: column.clamped_span(),
        })
        .with_class_str(column.class.as_deref());
        let id = self.tree.insert_child(parent, data);
        for (index, node) in column.content.iter().enumerate() {
            self.render_node(node, scope, id, &join_site(site, "n", index));
        }
        id
    }

    fn render_node(&mut self, node: &LayoutNode, scope: &Value, parent: MountId, site: &str) {
        match node {
            // A nested container renders as a fully recursive sub-walk,
            // sharing the context by reference.
            LayoutNode::Container(container) => {
                if should_render(container.visible.as_ref(), None, scope) {
                    self.mount_container(container, scope, Some(parent), site);
                }
            }
            LayoutNode::Row(row) => self.render_row(row, scope, parent, site),
            LayoutNode::Column(column) => self.render_column(column, scope, parent, site),
            LayoutNode::Component(component) => {
                self.render_component(component, scope, parent, site)
            }
        }
    }

    fn render_component(
        &mut self,
        component: &Component,
        scope: &Value,
        parent: MountId,
        site: &str,
    ) {
        if component.repeat.is_active() {
            self.reconcile(
                RepeatTarget::Component(component),
                &component.repeat,
                scope,
                parent,
                site,
            );
            return;
        }
        if !should_render(component.visible.as_ref(), Some(&component.conditions), scope) {
            return;
        }
        self.mount_component(component, scope, parent);
    }

    fn mount_component(
        &mut self,
        component: &Component,
        scope: &Value,
        parent: MountId,
    ) -> MountId {
        let Some(mut widget) = self.host.instantiate(&component.component) else {
            if self.debug {
                warn!(type_tag = %component.component, "unsupported component type");
            }
            self.report.unsupported += 1;
            let data = MountData::new(MountKind::Unsupported {
                type_tag: component.component.clone(),
            })
            .with_class_str(Some("unsupported"));
            return self.tree.insert_child(parent, data);
        };
        self.report.components += 1;

        for (key, value) in &component.config {
            widget.set_property(key, value.clone());
        }
        apply_dynamic(&mut *widget, component, scope);
        apply_i18n(&mut *widget, component, self.translate.as_ref());

        // Reverse wiring: a binding targeting the value property follows
        // widget changes back into the shared context.
        let mut value_backs = Vec::new();
        for (target, binding) in &component.bindings {
            if bind::is_value_target(target) {
                if let Some(path) = &binding.path {
                    if let Some(guard) = wire_value_back(&mut *widget, path, &self.context) {
                        value_backs.push(guard);
                    }
                }
            }
        }

        let mut data = MountData::new(MountKind::Component {
            type_tag: component.component.clone(),
        })
        .with_class_str(component.class.as_deref())
        .with_css_vars(component.css_vars.clone())
        .with_widget(widget);
        data.value_backs = value_backs;
        let id = self.tree.insert_child(parent, data);

        if !component.actions.is_empty() {
            self.triggers.insert(
                id,
                TriggerSeat {
                    triggers: component.actions.clone(),
                    base_scope: scope.clone(),
                },
            );
        }
        id
    }

    // ── Repeater reconciliation ──────────────────────────────────────

    fn reconcile(
        &mut self,
        target: RepeatTarget<'_>,
        repeat: &Repeat,
        scope: &Value,
        parent: MountId,
        site: &str,
    ) {
        self.visited_sites.insert(site.to_owned());

        let virtual_cap = match target {
            RepeatTarget::Component(component) if component.virtualize => {
                Some(component.virtual_limit)
            }
            _ => None,
        };
        let resolved = ResolvedRepeat::resolve(repeat, scope, virtual_cap);
        self.report.truncated += resolved.truncated;

        let mut state = self.repeats.remove(site).unwrap_or_default();
        let mut seen: Vec<KeyToken> = Vec::with_capacity(resolved.items.len());

        for (index, item) in resolved.items.iter().enumerate() {
            let item_scope = overlay_scope(scope, repeat, item, index);
            let eligible = match target {
                RepeatTarget::Row(row) => should_render(row.visible.as_ref(), None, &item_scope),
                RepeatTarget::Column(column) => {
                    should_render(column.visible.as_ref(), None, &item_scope)
                }
                RepeatTarget::Component(component) => should_render(
                    component.visible.as_ref(),
                    Some(&component.conditions),
                    &item_scope,
                ),
            };
            if !eligible {
                continue;
            }

            let key = item_key(repeat, &item_scope, index, &seen, self.debug);
            let child_site = format!("{site}/{}", key.as_str());

            match state.get(&key).filter(|entry| self.tree.contains(entry.mount)) {
                Some(entry) => {
                    // Kept: move under the fresh parent in collection order
                    // and rebind in place. The instance is not recreated.
                    self.tree.reparent(entry.mount, parent);
                    match target {
                        RepeatTarget::Row(row) => {
                            self.rebind_row(row, &item_scope, entry.mount, &child_site)
                        }
                        RepeatTarget::Column(column) => {
                            self.rebind_column(column, &item_scope, entry.mount, &child_site)
                        }
                        RepeatTarget::Component(component) => {
                            self.rebind_component(component, &item_scope, entry.mount)
                        }
                    }
                    self.report.reused += 1;
                }
                None => {
                    let mount = match target {
                        RepeatTarget::Row(row) => {
                            self.mount_row(row, &item_scope, parent, &child_site)
                        }
                        RepeatTarget::Column(column) => {
                            self.mount_column(column, &item_scope, parent, &child_site)
                        }
                        RepeatTarget::Component(component) => {
                            self.mount_component(component, &item_scope, parent)
                        }
                    };
                    state.insert(key.clone(), KeyedEntry { mount });
                }
            }
            seen.push(key);
        }

        let removed = state.retain_seen(&seen);
        self.repeats.insert(site.to_owned(), state);
        for entry in removed {
            self.destroy_subtree(entry.mount);
        }

        if resolved.collection_empty {
            if let Some(fallback) = &repeat.empty {
                let empty_site = format!("{site}/empty");
                self.render_node(fallback, scope, parent, &empty_site);
            }
        }
    }

    // ── Rebinding kept instances ─────────────────────────────────────

    /// Reapply bindings and widget-state conditions to a kept component
    /// instance without recreating it.
    fn rebind_component(&mut self, component: &Component, scope: &Value, mount: MountId) {
        if let Some(data) = self.tree.get_mut(mount) {
            if let Some(widget) = data.widget.as_mut() {
                apply_dynamic(&mut **widget, component, scope);
            }
        }
        if let Some(seat) = self.triggers.get_mut(mount) {
            seat.base_scope = scope.clone();
        }
    }

    /// Rebind a kept row subtree: pair its structural columns with the
    /// schema's eligible columns, rebuild on shape change, and reconcile
    /// nested repeats into the same mount.
    fn rebind_row(&mut self, row: &Row, scope: &Value, mount: MountId, site: &str) {
        let tracked = self.repeat_tracked_mounts(site);
        let structural: Vec<MountId> = self
            .tree
            .children(mount)
            .iter()
            .copied()
            .filter(|id| !tracked.contains(id))
            .collect();
        let eligible: Vec<(usize, &Column)> = row
            .columns
            .iter()
            .enumerate()
            .filter(|(_, column)| {
                !column.repeat.is_active() && should_render(column.visible.as_ref(), None, scope)
            })
            .collect();

        if structural.len() == eligible.len() {
            for (&child, (index, column)) in structural.iter().zip(&eligible) {
                self.rebind_column(column, scope, child, &join_site(site, "c", *index));
            }
        } else {
            for child in structural {
                self.destroy_subtree(child);
            }
            for (index, column) in &eligible {
                self.mount_column(column, scope, mount, &join_site(site, "c", *index));
            }
        }

        for (index, column) in row.columns.iter().enumerate() {
            if column.repeat.is_active() {
                self.render_column(column, scope, mount, &join_site(site, "c", index));
            }
        }
    }

    /// Rebind a kept column subtree; same pairing strategy as rows, with
    /// per-node kind matching since column content is heterogeneous.
    fn rebind_column(&mut self, column: &Column, scope: &Value, mount: MountId, site: &str) {
        let tracked = self.repeat_tracked_mounts(site);
        let structural: Vec<MountId> = self
            .tree
            .children(mount)
            .iter()
            .copied()
            .filter(|id| !tracked.contains(id))
            .collect();
        let eligible: Vec<(usize, &LayoutNode)> = column
            .content
            .iter()
            .enumerate()
            .filter(|(_, node)| {
                !node_repeat_active(node) && node_should_render(node, scope)
            })
            .collect();

        let shape_matches = structural.len() == eligible.len()
            && structural.iter().zip(&eligible).all(|(&child, (_, node))| {
                self.tree
                    .get(child)
                    .map(|data| node_matches_kind(node, &data.kind))
                    .unwrap_or(false)
            });

        if shape_matches {
            for (&child, (index, node)) in structural.iter().zip(&eligible) {
                self.rebind_node(node, scope, child, &join_site(site, "n", *index));
            }
        } else {
            for child in structural {
                self.destroy_subtree(child);
            }
            for (index, node) in &eligible {
                self.render_node(node, scope, mount, &join_site(site, "n", *index));
            }
        }

        for (index, node) in column.content.iter().enumerate() {
            if node_repeat_active(node) {
                self.render_node(node, scope, mount, &join_site(site, "n", index));
            }
        }
    }

    fn rebind_node(&mut self, node: &LayoutNode, scope: &Value, mount: MountId, site: &str) {
        match node {
            LayoutNode::Container(container) => {
                self.rebind_container(container, scope, mount, site)
            }
            LayoutNode::Row(row) => self.rebind_row(row, scope, mount, site),
            LayoutNode::Column(column) => self.rebind_column(column, scope, mount, site),
            LayoutNode::Component(component) => self.rebind_component(component, scope, mount),
        }
    }

    fn rebind_container(
        &mut self,
        container: &Container,
        scope: &Value,
        mount: MountId,
        site: &str,
    ) {
        let tracked = self.repeat_tracked_mounts(site);
        let structural: Vec<MountId> = self
            .tree
            .children(mount)
            .iter()
            .copied()
            .filter(|id| !tracked.contains(id))
            .collect();
        let eligible: Vec<(usize, &Row)> = container
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                !row.repeat.is_active() && should_render(row.visible.as_ref(), None, scope)
            })
            .collect();

        if structural.len() == eligible.len() {
            for (&child, (index, row)) in structural.iter().zip(&eligible) {
                self.rebind_row(row, scope, child, &join_site(site, "r", *index));
            }
        } else {
            for child in structural {
                self.destroy_subtree(child);
            }
            for (index, row) in &eligible {
                self.mount_row(row, scope, mount, &join_site(site, "r", *index));
            }
        }

        for (index, row) in container.rows.iter().enumerate() {
            if row.repeat.is_active() {
                self.render_row(row, scope, mount, &join_site(site, "r", index));
            }
        }
    }

    /// Mounts owned by repeat sites nested under `site`.
    fn repeat_tracked_mounts(&self, site: &str) -> HashSet<MountId> {
        let prefix = format!("{site}/");
        self.repeats
            .iter()
            .filter(|(tracked_site, _)| tracked_site.starts_with(&prefix))
            .flat_map(|(_, state)| state.entries().map(|entry| entry.mount))
            .collect()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("phase", &self.phase)
            .field("mounts", &self.tree.len())
            .field("repeat_sites", &self.repeats.len())
            .field("last_error", &self.last_error)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn join_site(site: &str, tag: &str, index: usize) -> String {
    if site.is_empty() {
        format!("{tag}{index}")
    } else {
        format!("{site}/{tag}{index}")
    }
}

/// Apply bindings and disabled/readonly conditions onto a widget.
///
/// Runs at creation and again on every rebind of a kept instance.
fn apply_dynamic(widget: &mut dyn WidgetInstance, component: &Component, scope: &Value) {
    for (target, binding) in &component.bindings {
        if let Some(value) = bind::resolve(binding, scope) {
            widget.set_property(bind::property_name(target), value);
        }
    }
    if let Some(expr) = &component.conditions.disabled {
        let disabled = truthy_opt(evaluate(expr, scope).as_ref());
        widget.set_property("disabled", Value::Bool(disabled));
    }
    if let Some(expr) = &component.conditions.readonly {
        let readonly = truthy_opt(evaluate(expr, scope).as_ref());
        widget.set_property("readonly", Value::Bool(readonly));
    }
}

/// Resolve i18n keys through the translator, falling back to the raw key.
fn apply_i18n(
    widget: &mut dyn WidgetInstance,
    component: &Component,
    translate: Option<&TranslateFn>,
) {
    let Some(i18n) = &component.i18n else {
        return;
    };
    let resolve = |key: &str| -> String {
        translate
            .map(|f| f(key))
            .unwrap_or_else(|| key.to_owned())
    };
    if let Some(key) = &i18n.label_key {
        widget.set_property("label", Value::String(resolve(key)));
    }
    for (property, key) in &i18n.placeholders {
        widget.set_property(property, Value::String(resolve(key)));
    }
}

fn node_repeat_active(node: &LayoutNode) -> bool {
    match node {
        LayoutNode::Container(_) => false,
        LayoutNode::Row(row) => row.repeat.is_active(),
        LayoutNode::Column(column) => column.repeat.is_active(),
        LayoutNode::Component(component) => component.repeat.is_active(),
    }
}

fn node_should_render(node: &LayoutNode, scope: &Value) -> bool {
    match node {
        LayoutNode::Container(container) => {
            should_render(container.visible.as_ref(), None, scope)
        }
        LayoutNode::Row(row) => should_render(row.visible.as_ref(), None, scope),
        LayoutNode::Column(column) => should_render(column.visible.as_ref(), None, scope),
        LayoutNode::Component(component) => {
            should_render(component.visible.as_ref(), Some(&component.conditions), scope)
        }
    }
}

fn node_matches_kind(node: &LayoutNode, kind: &MountKind) -> bool {
    match (node, kind) {
        (LayoutNode::Container(_), MountKind::Container { .. }) => true,
        (LayoutNode::Row(_), MountKind::Row) => true,
        (LayoutNode::Column(_), MountKind::Column { .. }) => true,
        (
            LayoutNode::Component(_),
            MountKind::Component { .. } | MountKind::Unsupported { .. },
        ) => true,
        _ => false,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HeadlessWidget;
    use crate::schema::{ActionDef, Binding, Expr};
    use serde_json::json;

    fn text_schema() -> Value {
        json!({
            "root": {
                "kind": "container",
                "rows": [{
                    "kind": "row",
                    "columns": [{
                        "kind": "column",
                        "span": 12,
                        "content": [{
                            "kind": "component",
                            "component": "text",
                            "config": {"label": "Name"}
                        }]
                    }]
                }]
            }
        })
    }

    #[test]
    fn phase_starts_idle() {
        let interp = Interpreter::headless();
        assert_eq!(interp.phase(), Phase::Idle);
        assert!(interp.last_error().is_none());
    }

    #[test]
    fn minimal_render_mounts_one_widget() {
        let mut interp = Interpreter::headless();
        interp.render_value(text_schema(), json!({})).unwrap();
        assert_eq!(interp.phase(), Phase::Rendered);

        let components = interp.tree().query_by_component("text");
        assert_eq!(components.len(), 1);
        let widget: &HeadlessWidget = interp.widget_as(components[0]).unwrap();
        assert_eq!(widget.property("label"), Some(&json!("Name")));
        assert_eq!(interp.report().components, 1);
    }

    #[test]
    fn render_json_string_input() {
        let mut interp = Interpreter::headless();
        let text = serde_json::to_string(&text_schema()).unwrap();
        interp.render_json(&text, json!({})).unwrap();
        assert_eq!(interp.tree().query_by_component("text").len(), 1);
    }

    #[test]
    fn parse_failure_keeps_previous_output() {
        let mut interp = Interpreter::headless();
        interp.render_value(text_schema(), json!({})).unwrap();
        let before = interp.tree().len();

        let err = interp.render_json("{broken", json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::Parse(_)));
        assert_eq!(interp.phase(), Phase::Error);
        assert!(interp.last_error().unwrap().contains("invalid schema JSON"));
        assert_eq!(interp.tree().len(), before);
    }

    #[test]
    fn shape_failure_is_recoverable() {
        let mut interp = Interpreter::headless();
        let err = interp.render_value(json!({"nope": 1}), json!({})).unwrap_err();
        assert!(matches!(err, SchemaError::Shape(_)));
        assert_eq!(interp.phase(), Phase::Error);

        interp.render_value(text_schema(), json!({})).unwrap();
        assert_eq!(interp.phase(), Phase::Rendered);
    }

    #[test]
    fn unsupported_component_is_placeholder_not_fatal() {
        let mut interp = Interpreter::headless();
        interp
            .render_value(
                json!({
                    "root": {"kind": "container", "rows": [{
                        "kind": "row",
                        "columns": [{"kind": "column", "content": [
                            {"kind": "component", "component": "hologram"},
                            {"kind": "component", "component": "text"}
                        ]}]
                    }]}
                }),
                json!({}),
            )
            .unwrap();

        assert_eq!(interp.report().unsupported, 1);
        assert_eq!(interp.report().components, 1);
        let placeholders = interp.tree().query_by_kind("unsupported");
        assert_eq!(placeholders.len(), 1);
        let data = interp.tree().get(placeholders[0]).unwrap();
        assert!(data.has_class("unsupported"));
        assert_eq!(data.type_tag(), Some("hologram"));
    }

    #[test]
    fn context_defaults_merge_under_external() {
        let mut interp = Interpreter::headless();
        interp
            .render_value(
                json!({
                    "root": {"kind": "container", "rows": []},
                    "contextDefaults": {"a": 1, "b": 2}
                }),
                json!({"b": 9}),
            )
            .unwrap();
        assert_eq!(interp.context().get("a"), Some(json!(1)));
        assert_eq!(interp.context().get("b"), Some(json!(9)));
    }

    #[test]
    fn hidden_root_renders_nothing() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_visible(Expr::literal(false)));
        interp.render_document(doc, json!({})).unwrap();
        assert!(interp.tree().root().is_none());
        assert_eq!(interp.phase(), Phase::Rendered);
    }

    #[test]
    fn i18n_falls_back_to_raw_key() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("text").with_config("x", 1).with_conditions(Default::default()),
            )),
        )));
        // Rebuild with i18n attached.
        let mut doc = doc;
        if let LayoutNode::Component(comp) = &mut doc.root.rows[0].columns[0].content[0] {
            comp.i18n = Some(crate::schema::I18n {
                label_key: Some("form.name".to_owned()),
                placeholders: Default::default(),
            });
        }
        interp.render_document(doc, json!({})).unwrap();

        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("label"), Some(&json!("form.name")));
    }

    #[test]
    fn i18n_uses_translator() {
        let mut interp = Interpreter::headless().with_translator(|key| format!("T:{key}"));
        let mut component = Component::new("text");
        component.i18n = Some(crate::schema::I18n {
            label_key: Some("form.name".to_owned()),
            placeholders: [("placeholder".to_owned(), "form.hint".to_owned())].into(),
        });
        let doc = Document::from_root(Container::new().with_row(
            Row::new().with_column(Column::new().with_content(LayoutNode::Component(component))),
        ));
        interp.render_document(doc, json!({})).unwrap();

        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("label"), Some(&json!("T:form.name")));
        assert_eq!(widget.property("placeholder"), Some(&json!("T:form.hint")));
    }

    #[test]
    fn disabled_condition_sets_widget_state() {
        let mut interp = Interpreter::headless();
        let component = Component::new("text").with_conditions(crate::schema::Conditions {
            disabled: Some(Expr::path("locked")),
            ..Default::default()
        });
        let doc = Document::from_root(Container::new().with_row(
            Row::new().with_column(Column::new().with_content(LayoutNode::Component(component))),
        ));
        interp.render_document(doc.clone(), json!({"locked": true})).unwrap();
        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("disabled"), Some(&json!(true)));

        interp.update_context(json!({"locked": false}));
        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("disabled"), Some(&json!(false)));
    }

    #[test]
    fn nested_container_renders_recursively() {
        let mut interp = Interpreter::headless();
        interp
            .render_value(
                json!({
                    "root": {"kind": "container", "rows": [{
                        "kind": "row",
                        "columns": [{"kind": "column", "content": [{
                            "kind": "container",
                            "title": "inner",
                            "rows": [{"kind": "row", "columns": [{
                                "kind": "column",
                                "content": [{"kind": "component", "component": "badge"}]
                            }]}]
                        }]}]
                    }]}
                }),
                json!({}),
            )
            .unwrap();
        assert_eq!(interp.tree().query_by_kind("container").len(), 2);
        assert_eq!(interp.tree().query_by_component("badge").len(), 1);
    }

    #[test]
    fn action_trigger_fires_into_table() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("button").with_trigger(ActionTrigger::click("go")),
            )),
        )))
        .with_action(ActionDef::navigate("go", "/docs"));
        interp.render_document(doc, json!({})).unwrap();

        let id = interp.tree().query_by_component("button")[0];
        let mut event = UiEvent::new("click");
        assert!(interp.fire(id, &mut event));
        assert_eq!(interp.dispatcher().last_location(), Some("/docs"));
    }

    #[test]
    fn fire_ignores_unmatched_event() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("button").with_trigger(ActionTrigger::click("go")),
            )),
        )))
        .with_action(ActionDef::navigate("go", "/docs"));
        interp.render_document(doc, json!({})).unwrap();

        let id = interp.tree().query_by_component("button")[0];
        assert!(!interp.fire(id, &mut UiEvent::new("hover")));
        assert!(interp.dispatcher().last_location().is_none());
    }

    #[test]
    fn value_binding_initializes_widget() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("text").with_binding("value", Binding::path("user.name")),
            )),
        )));
        interp
            .render_document(doc, json!({"user": {"name": "Ada"}}))
            .unwrap();

        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("value"), Some(&json!("Ada")));
    }

    #[test]
    fn value_change_writes_back_into_context() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("text").with_binding("value", Binding::path("user.name")),
            )),
        )));
        interp
            .render_document(doc, json!({"user": {"name": "Ada"}}))
            .unwrap();

        let id = interp.tree().query_by_component("text")[0];
        interp
            .widget_as_mut::<HeadlessWidget>(id)
            .unwrap()
            .emit_value(json!("Grace"));
        assert_eq!(interp.context().get("user.name"), Some(json!("Grace")));
    }

    #[test]
    fn config_value_target_also_wires_back() {
        let mut interp = Interpreter::headless();
        let doc = Document::from_root(Container::new().with_row(Row::new().with_column(
            Column::new().with_content(LayoutNode::Component(
                Component::new("text").with_binding("config.value", Binding::path("amount")),
            )),
        )));
        interp.render_document(doc, json!({"amount": 10})).unwrap();

        let id = interp.tree().query_by_component("text")[0];
        let widget: &HeadlessWidget = interp.widget_as(id).unwrap();
        assert_eq!(widget.property("value"), Some(&json!(10)));

        interp
            .widget_as_mut::<HeadlessWidget>(id)
            .unwrap()
            .emit_value(json!(25));
        assert_eq!(interp.context().get("amount"), Some(json!(25)));
    }

    #[test]
    fn css_vars_and_classes_land_on_mount() {
        let mut interp = Interpreter::headless();
        let component = Component::new("badge")
            .with_class("chip accent")
            .with_css_var("--chip-color", "teal");
        let doc = Document::from_root(Container::new().with_row(
            Row::new().with_column(Column::new().with_content(LayoutNode::Component(component))),
        ));
        interp.render_document(doc, json!({})).unwrap();

        let id = interp.tree().query_by_component("badge")[0];
        let data = interp.tree().get(id).unwrap();
        assert!(data.has_class("chip"));
        assert!(data.has_class("accent"));
        assert_eq!(
            data.css_vars.get("--chip-color").map(String::as_str),
            Some("teal")
        );
    }

    #[test]
    fn column_span_clamped_on_mount() {
        let mut interp = Interpreter::headless();
        interp
            .render_value(
                json!({"root": {"kind": "container", "rows": [{
                    "kind": "row",
                    "columns": [{"kind": "column", "span": 40, "content": []}]
                }]}}),
                json!({}),
            )
            .unwrap();
        let columns = interp.tree().query_by_kind("column");
        let data = interp.tree().get(columns[0]).unwrap();
        assert_eq!(data.kind, MountKind::Column { span: 12 });
    }
}
