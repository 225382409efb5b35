// Connection records — aggregate flows, feature membership and generic adjacency.
//
// Records hold vertex ids only; names and metadata are resolved through the
// analyzer's vertex maps, so a vertex merge is visible in every record.

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

use crate::vertex::VertexType;

/// Two different commands claimed the same aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandConflict {
    pub aggregate: String,
    pub existing: String,
    pub incoming: String,
}

// ── Aggregate connections ──────────────────────────────────────────

/// What drives an aggregate: nothing yet, one command, or bare events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "flow", rename_all = "camelCase")]
pub enum AggregateFlow {
    Empty,
    CommandDriven {
        command: String,
        events: IndexSet<String>,
    },
    EventOnly {
        events: IndexSet<String>,
    },
}

impl AggregateFlow {
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::CommandDriven { command, .. } => Some(command.as_str()),
            _ => None,
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        let events = match self {
            Self::CommandDriven { events, .. } | Self::EventOnly { events } => Some(events),
            Self::Empty => None,
        };
        events.into_iter().flatten().map(String::as_str)
    }

    fn add_events<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut incoming = incoming.into_iter().peekable();
        if incoming.peek().is_none() {
            return;
        }
        match self {
            Self::Empty => {
                *self = Self::EventOnly {
                    events: incoming.collect(),
                };
            }
            Self::CommandDriven { events, .. } | Self::EventOnly { events } => {
                events.extend(incoming);
            }
        }
    }

    /// Caller has checked that no other command is set.
    fn set_command(&mut self, command: String) {
        *self = match std::mem::replace(self, Self::Empty) {
            Self::Empty => Self::CommandDriven {
                command,
                events: IndexSet::new(),
            },
            Self::EventOnly { events } | Self::CommandDriven { events, .. } => {
                Self::CommandDriven { command, events }
            }
        };
    }

    fn detach(&mut self, id: &str) -> bool {
        match self {
            Self::CommandDriven { command, events } if command.as_str() == id => {
                let events = std::mem::take(events);
                *self = if events.is_empty() {
                    Self::Empty
                } else {
                    Self::EventOnly { events }
                };
                true
            }
            Self::CommandDriven { events, .. } | Self::EventOnly { events } => {
                let removed = events.shift_remove(id);
                if matches!(self, Self::EventOnly { events } if events.is_empty()) {
                    *self = Self::Empty;
                }
                removed
            }
            Self::Empty => false,
        }
    }
}

/// The command/event flow and documents around one aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateConnection {
    aggregate: String,
    #[serde(flatten)]
    flow: AggregateFlow,
    documents: IndexSet<String>,
}

impl AggregateConnection {
    pub fn new(aggregate: impl Into<String>) -> Self {
        Self {
            aggregate: aggregate.into(),
            flow: AggregateFlow::Empty,
            documents: IndexSet::new(),
        }
    }

    #[must_use]
    pub fn with_command_events<I>(mut self, command: impl Into<String>, events: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.flow = AggregateFlow::CommandDriven {
            command: command.into(),
            events: events.into_iter().collect(),
        };
        self
    }

    #[must_use]
    pub fn with_events<I>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.flow.add_events(events);
        self
    }

    #[must_use]
    pub fn with_documents<I>(mut self, documents: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.documents.extend(documents);
        self
    }

    /// Aggregate vertex id.
    pub fn aggregate(&self) -> &str {
        &self.aggregate
    }

    pub fn flow(&self) -> &AggregateFlow {
        &self.flow
    }

    pub fn command(&self) -> Option<&str> {
        self.flow.command()
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.flow.events()
    }

    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.documents.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.flow == AggregateFlow::Empty && self.documents.is_empty()
    }

    /// Whether `id` fills the command slot or is listed as event or document.
    pub fn contains(&self, id: &str) -> bool {
        self.command() == Some(id) || self.events().any(|e| e == id) || self.documents.contains(id)
    }

    /// Union `other` into this record.
    ///
    /// Fails without touching `self` when both records name different commands.
    pub fn merge(&mut self, other: &AggregateConnection) -> Result<(), CommandConflict> {
        if let (Some(existing), Some(incoming)) = (self.command(), other.command()) {
            if existing != incoming {
                return Err(CommandConflict {
                    aggregate: self.aggregate.clone(),
                    existing: existing.to_string(),
                    incoming: incoming.to_string(),
                });
            }
        }
        if let Some(command) = other.command() {
            if self.command().is_none() {
                self.flow.set_command(command.to_string());
            }
        }
        self.flow.add_events(other.events().map(str::to_string));
        self.documents.extend(other.documents.iter().cloned());
        Ok(())
    }

    /// Drop `id` from every slot. A detached command demotes the flow.
    pub fn detach(&mut self, id: &str) -> bool {
        let in_flow = self.flow.detach(id);
        let in_documents = self.documents.shift_remove(id);
        in_flow || in_documents
    }
}

/// Aggregate connections keyed by aggregate id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateConnectionMap {
    connections: IndexMap<String, AggregateConnection>,
}

impl AggregateConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `connection`, discarding any previous record for its aggregate.
    pub fn replace(&mut self, connection: AggregateConnection) {
        self.connections
            .insert(connection.aggregate.clone(), connection);
    }

    /// Union `connection` into the stored record, or store it.
    pub fn merge(&mut self, connection: AggregateConnection) -> Result<(), CommandConflict> {
        match self.connections.get_mut(connection.aggregate()) {
            Some(existing) => existing.merge(&connection),
            None => {
                self.replace(connection);
                Ok(())
            }
        }
    }

    /// Store every record of `changes`, replacing the previous ones.
    pub fn apply(&mut self, changes: AggregateConnectionMap) {
        self.connections.extend(changes.connections);
    }

    /// Record of `aggregate` in this change set, copied from `base` on first touch.
    pub(crate) fn staged(&mut self, base: &AggregateConnectionMap, aggregate: &str) -> &mut AggregateConnection {
        self.connections
            .entry(aggregate.to_string())
            .or_insert_with(|| {
                base.connection(aggregate)
                    .cloned()
                    .unwrap_or_else(|| AggregateConnection::new(aggregate))
            })
    }

    /// Stage `id` detached from every record of `base` or this change set
    /// whose aggregate is not in `keep`.
    pub(crate) fn detach_except(&mut self, base: &AggregateConnectionMap, id: &str, keep: &IndexSet<String>) {
        let holders: Vec<String> = base
            .iter()
            .chain(self.iter())
            .filter(|c| !keep.contains(c.aggregate()) && c.contains(id))
            .map(|c| c.aggregate().to_string())
            .collect();
        for aggregate in holders {
            self.staged(base, &aggregate).detach(id);
        }
    }

    pub fn remove(&mut self, aggregate: &str) -> Option<AggregateConnection> {
        self.connections.shift_remove(aggregate)
    }

    /// Drop `id` from every record's command, events and documents.
    pub fn detach(&mut self, id: &str) {
        for connection in self.connections.values_mut() {
            connection.detach(id);
        }
    }

    /// Forget the flow between `a` and `b` in whichever of them is an aggregate.
    pub fn unlink(&mut self, a: &str, b: &str) -> bool {
        let mut removed = false;
        if let Some(connection) = self.connections.get_mut(a) {
            removed |= connection.detach(b);
        }
        if let Some(connection) = self.connections.get_mut(b) {
            removed |= connection.detach(a);
        }
        removed
    }

    pub fn has(&self, aggregate: &str) -> bool {
        self.connections.contains_key(aggregate)
    }

    pub fn connection(&self, aggregate: &str) -> Option<&AggregateConnection> {
        self.connections.get(aggregate)
    }

    /// Aggregate driven by `command`.
    pub fn aggregate_of_command(&self, command: &str) -> Option<&str> {
        self.iter()
            .find(|c| c.command() == Some(command))
            .map(AggregateConnection::aggregate)
    }

    /// First aggregate recording `event`.
    pub fn aggregate_of_event(&self, event: &str) -> Option<&str> {
        self.iter()
            .find(|c| c.events().any(|e| e == event))
            .map(AggregateConnection::aggregate)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregateConnection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Serialize for AggregateConnectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.connections.values())
    }
}

// ── Feature connections ────────────────────────────────────────────

/// Member sets of one feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureConnection {
    feature: String,
    commands: IndexSet<String>,
    events: IndexSet<String>,
    aggregates: IndexSet<String>,
    documents: IndexSet<String>,
    external_systems: IndexSet<String>,
    hot_spots: IndexSet<String>,
    policies: IndexSet<String>,
    uis: IndexSet<String>,
}

impl FeatureConnection {
    /// Kinds a feature records membership for.
    pub const MEMBER_KINDS: [VertexType; 8] = [
        VertexType::Command,
        VertexType::Event,
        VertexType::Aggregate,
        VertexType::Document,
        VertexType::ExternalSystem,
        VertexType::HotSpot,
        VertexType::Policy,
        VertexType::Ui,
    ];

    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            commands: IndexSet::new(),
            events: IndexSet::new(),
            aggregates: IndexSet::new(),
            documents: IndexSet::new(),
            external_systems: IndexSet::new(),
            hot_spots: IndexSet::new(),
            policies: IndexSet::new(),
            uis: IndexSet::new(),
        }
    }

    /// Add members of `kind`; kinds outside [`MEMBER_KINDS`](Self::MEMBER_KINDS) are ignored.
    #[must_use]
    pub fn with<I>(mut self, kind: VertexType, ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(slot) = self.slot_mut(kind) {
            slot.extend(ids);
        }
        self
    }

    /// Feature vertex id.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    pub fn members(&self, kind: VertexType) -> Option<&IndexSet<String>> {
        match kind {
            VertexType::Command => Some(&self.commands),
            VertexType::Event => Some(&self.events),
            VertexType::Aggregate => Some(&self.aggregates),
            VertexType::Document => Some(&self.documents),
            VertexType::ExternalSystem => Some(&self.external_systems),
            VertexType::HotSpot => Some(&self.hot_spots),
            VertexType::Policy => Some(&self.policies),
            VertexType::Ui => Some(&self.uis),
            VertexType::Role | VertexType::Feature | VertexType::BoundedContext => None,
        }
    }

    fn slot_mut(&mut self, kind: VertexType) -> Option<&mut IndexSet<String>> {
        match kind {
            VertexType::Command => Some(&mut self.commands),
            VertexType::Event => Some(&mut self.events),
            VertexType::Aggregate => Some(&mut self.aggregates),
            VertexType::Document => Some(&mut self.documents),
            VertexType::ExternalSystem => Some(&mut self.external_systems),
            VertexType::HotSpot => Some(&mut self.hot_spots),
            VertexType::Policy => Some(&mut self.policies),
            VertexType::Ui => Some(&mut self.uis),
            VertexType::Role | VertexType::Feature | VertexType::BoundedContext => None,
        }
    }

    pub fn commands(&self) -> &IndexSet<String> {
        &self.commands
    }

    pub fn events(&self) -> &IndexSet<String> {
        &self.events
    }

    pub fn aggregates(&self) -> &IndexSet<String> {
        &self.aggregates
    }

    pub fn documents(&self) -> &IndexSet<String> {
        &self.documents
    }

    pub fn external_systems(&self) -> &IndexSet<String> {
        &self.external_systems
    }

    pub fn hot_spots(&self) -> &IndexSet<String> {
        &self.hot_spots
    }

    pub fn policies(&self) -> &IndexSet<String> {
        &self.policies
    }

    pub fn uis(&self) -> &IndexSet<String> {
        &self.uis
    }

    fn slots(&self) -> impl Iterator<Item = &IndexSet<String>> {
        Self::MEMBER_KINDS
            .into_iter()
            .filter_map(move |kind| self.members(kind))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots().any(|slot| slot.contains(id))
    }

    pub fn member_count(&self) -> usize {
        self.slots().map(IndexSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.member_count() == 0
    }

    pub fn merge(&mut self, other: &FeatureConnection) {
        for kind in Self::MEMBER_KINDS {
            if let (Some(slot), Some(incoming)) = (
                self.slot_mut(kind),
                other.members(kind),
            ) {
                slot.extend(incoming.iter().cloned());
            }
        }
    }

    pub fn detach(&mut self, id: &str) -> bool {
        let mut removed = false;
        for kind in Self::MEMBER_KINDS {
            if let Some(slot) = self.slot_mut(kind) {
                removed |= slot.shift_remove(id);
            }
        }
        removed
    }
}

/// Feature connections keyed by feature id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureConnectionMap {
    connections: IndexMap<String, FeatureConnection>,
}

impl FeatureConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, connection: FeatureConnection) {
        self.connections
            .insert(connection.feature.clone(), connection);
    }

    pub fn merge(&mut self, connection: FeatureConnection) {
        match self.connections.get_mut(connection.feature()) {
            Some(existing) => existing.merge(&connection),
            None => self.replace(connection),
        }
    }

    pub fn apply(&mut self, changes: FeatureConnectionMap) {
        self.connections.extend(changes.connections);
    }

    pub(crate) fn staged(&mut self, base: &FeatureConnectionMap, feature: &str) -> &mut FeatureConnection {
        self.connections
            .entry(feature.to_string())
            .or_insert_with(|| {
                base.connection(feature)
                    .cloned()
                    .unwrap_or_else(|| FeatureConnection::new(feature))
            })
    }

    pub(crate) fn detach_except(&mut self, base: &FeatureConnectionMap, id: &str, keep: &IndexSet<String>) {
        let holders: Vec<String> = base
            .iter()
            .chain(self.iter())
            .filter(|c| !keep.contains(c.feature()) && c.contains(id))
            .map(|c| c.feature().to_string())
            .collect();
        for feature in holders {
            self.staged(base, &feature).detach(id);
        }
    }

    pub fn remove(&mut self, feature: &str) -> Option<FeatureConnection> {
        self.connections.shift_remove(feature)
    }

    pub fn detach(&mut self, id: &str) {
        for connection in self.connections.values_mut() {
            connection.detach(id);
        }
    }

    pub fn has(&self, feature: &str) -> bool {
        self.connections.contains_key(feature)
    }

    pub fn connection(&self, feature: &str) -> Option<&FeatureConnection> {
        self.connections.get(feature)
    }

    /// First feature listing `id` as a member.
    pub fn feature_of(&self, id: &str) -> Option<&str> {
        self.iter()
            .find(|c| c.contains(id))
            .map(FeatureConnection::feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureConnection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Serialize for FeatureConnectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.connections.values())
    }
}

// ── Generic adjacency ──────────────────────────────────────────────

/// Direct neighbourhood of one vertex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexConnection {
    vertex: String,
    #[serde(rename = "type")]
    kind: VertexType,
    from: IndexSet<String>,
    to: IndexSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<String>,
    children: IndexSet<String>,
}

impl VertexConnection {
    pub fn new(vertex: impl Into<String>, kind: VertexType) -> Self {
        Self {
            vertex: vertex.into(),
            kind,
            from: IndexSet::new(),
            to: IndexSet::new(),
            parent: None,
            children: IndexSet::new(),
        }
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn kind(&self) -> VertexType {
        self.kind
    }

    /// Ids with an edge into this vertex.
    pub fn from(&self) -> &IndexSet<String> {
        &self.from
    }

    /// Ids this vertex has an edge to.
    pub fn to(&self) -> &IndexSet<String> {
        &self.to
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &IndexSet<String> {
        &self.children
    }

    fn forget(&mut self, id: &str) {
        self.from.shift_remove(id);
        self.to.shift_remove(id);
        self.children.shift_remove(id);
        if self.parent.as_deref() == Some(id) {
            self.parent = None;
        }
    }
}

/// A vertex id together with its kind.
pub(crate) type Endpoint = (String, VertexType);

/// Full neighbourhood of a focal vertex as observed in one analysis.
#[derive(Debug, Default)]
pub(crate) struct Adjacency {
    pub(crate) from: Vec<Endpoint>,
    pub(crate) to: Vec<Endpoint>,
    pub(crate) parent: Option<Endpoint>,
    pub(crate) children: Vec<Endpoint>,
}

/// Generic adjacency records keyed by vertex id. Links are kept symmetric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexConnectionMap {
    connections: IndexMap<String, VertexConnection>,
}

impl VertexConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ensure(&mut self, id: &str, kind: VertexType) -> &mut VertexConnection {
        self.connections
            .entry(id.to_string())
            .or_insert_with(|| VertexConnection::new(id, kind))
    }

    /// Record an edge `from → to`.
    pub(crate) fn link(&mut self, from: &Endpoint, to: &Endpoint) {
        self.ensure(&from.0, from.1).to.insert(to.0.clone());
        self.ensure(&to.0, to.1).from.insert(from.0.clone());
    }

    /// Make `parent` the parent of `child`, leaving any previous parent.
    pub(crate) fn adopt(&mut self, parent: &Endpoint, child: &Endpoint) {
        let previous = self.ensure(&child.0, child.1).parent.replace(parent.0.clone());
        if let Some(previous) = previous.filter(|p| *p != parent.0) {
            if let Some(old) = self.connections.get_mut(&previous) {
                old.children.shift_remove(&child.0);
            }
        }
        self.ensure(&parent.0, parent.1)
            .children
            .insert(child.0.clone());
    }

    /// Drop the edge `from → to`, keeping both records.
    pub(crate) fn unlink(&mut self, from: &str, to: &str) {
        if let Some(c) = self.connections.get_mut(from) {
            c.to.shift_remove(to);
        }
        if let Some(c) = self.connections.get_mut(to) {
            c.from.shift_remove(from);
        }
    }

    /// Replace the neighbourhood of `focal` and repair reverse links.
    pub(crate) fn replace(&mut self, focal: &Endpoint, adjacency: Adjacency) {
        let id = focal.0.as_str();
        let stale = std::mem::replace(
            self.ensure(id, focal.1),
            VertexConnection::new(id, focal.1),
        );

        for source in &stale.from {
            if let Some(c) = self.connections.get_mut(source) {
                c.to.shift_remove(id);
            }
        }
        for target in &stale.to {
            if let Some(c) = self.connections.get_mut(target) {
                c.from.shift_remove(id);
            }
        }
        if let Some(parent) = &stale.parent {
            if let Some(c) = self.connections.get_mut(parent) {
                c.children.shift_remove(id);
            }
        }
        for child in &stale.children {
            if let Some(c) = self.connections.get_mut(child) {
                if c.parent.as_deref() == Some(id) {
                    c.parent = None;
                }
            }
        }

        for source in &adjacency.from {
            self.link(source, focal);
        }
        for target in &adjacency.to {
            self.link(focal, target);
        }
        if let Some(parent) = &adjacency.parent {
            self.adopt(parent, focal);
        }
        for child in &adjacency.children {
            self.adopt(focal, child);
        }
    }

    /// Delete the record of `id` and every link pointing at it.
    pub fn remove(&mut self, id: &str) -> Option<VertexConnection> {
        let removed = self.connections.shift_remove(id)?;
        for connection in self.connections.values_mut() {
            connection.forget(id);
        }
        Some(removed)
    }

    pub fn has(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn connection(&self, id: &str) -> Option<&VertexConnection> {
        self.connections.get(id)
    }

    pub fn filter_by_type(&self, kind: VertexType) -> impl Iterator<Item = &VertexConnection> {
        self.iter().filter(move |c| c.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VertexConnection> {
        self.connections.values()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Serialize for VertexConnectionMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.connections.values())
    }
}
