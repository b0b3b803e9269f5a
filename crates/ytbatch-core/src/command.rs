//! Command sum type and per-command parameter records.
//!
//! Each `execute_batch` command tag maps to exactly one parameter shape. The
//! mapping is the [`Command`] enum: adding a command means adding a variant,
//! and every `match` over it (wire encoding, wire decoding, kind lookup) stops
//! compiling until the new variant is handled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseCommandError;
use crate::request::SubRequest;

// ─── Parameter records ────────────────────────────────────────────────────────

/// Fields shared by every parameter record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseParams {
    /// Run the command inside this master transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// Free-form client marker used to trace requests in proxy logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathParams {
    pub path: String,
    #[serde(flatten)]
    pub base: BaseParams,
}

impl PathParams {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), base: BaseParams::default() }
    }
}

/// `get` / `list` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathAttrParams {
    pub path: String,
    /// Attributes to fetch alongside the node value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(flatten)]
    pub base: BaseParams,
}

impl PathAttrParams {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: None,
            fields: None,
            base: BaseParams::default(),
        }
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Some(attributes.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyMoveParams {
    pub source_path: String,
    pub destination_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preserve_account: Option<bool>,
    #[serde(flatten)]
    pub base: BaseParams,
}

impl CopyMoveParams {
    pub fn new(source_path: impl Into<String>, destination_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: destination_path.into(),
            preserve_account: None,
            base: BaseParams::default(),
        }
    }
}

/// Marker for a sorted merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    Sorted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedMerge {
    pub mode: MergeMode,
}

/// Operation spec of a `merge` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeSpec {
    pub input_table_paths: Vec<String>,
    pub output_table_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_transform: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorted: Option<SortedMerge>,
}

impl MergeSpec {
    pub fn new<I, S>(inputs: I, output: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input_table_paths: inputs.into_iter().map(Into::into).collect(),
            output_table_path: output.into(),
            force_transform: None,
            sorted: None,
        }
    }

    pub fn sorted(mut self) -> Self {
        self.sorted = Some(SortedMerge { mode: MergeMode::Sorted });
        self
    }

    pub fn force_transform(mut self, force: bool) -> Self {
        self.force_transform = Some(force);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeParams {
    pub spec: MergeSpec,
    #[serde(flatten)]
    pub base: BaseParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckPermissionParams {
    pub user: String,
    pub path: String,
    pub permission: String,
    #[serde(flatten)]
    pub base: BaseParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPoolQuotaParams {
    pub source_pool: String,
    pub destination_pool: String,
    pub pool_tree: String,
    /// Opaque resource map, e.g. `{"strong_guarantee_resources": {"cpu": 4}}`.
    pub resource_delta: Value,
    #[serde(flatten)]
    pub base: BaseParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Use,
    Mount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Allow,
}

/// One ACE of an ad-hoc ACL passed to `check_permission_by_acl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AclEntry {
    pub permissions: Vec<Permission>,
    pub subjects: Vec<String>,
    pub action: AclAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckAclParams {
    pub acl: Vec<AclEntry>,
    pub user: String,
    pub permission: Permission,
    #[serde(flatten)]
    pub base: BaseParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetQueryParams {
    pub query_id: String,
    pub stage: String,
    #[serde(flatten)]
    pub base: BaseParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteBatchParams {
    pub requests: Vec<SubRequest>,
    #[serde(flatten)]
    pub base: BaseParams,
}

// ─── Command ──────────────────────────────────────────────────────────────────

/// A command together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TransferPoolResources(TransferPoolQuotaParams),
    MountTable(PathParams),
    UnmountTable(PathParams),
    FreezeTable(PathParams),
    UnfreezeTable(PathParams),
    CheckPermission(CheckPermissionParams),
    Set(PathParams),
    Remove(PathParams),
    Get(PathAttrParams),
    List(PathAttrParams),
    Exists(PathParams),
    Copy(CopyMoveParams),
    Move(CopyMoveParams),
    Merge(MergeParams),
    ExecuteBatch(ExecuteBatchParams),
    CheckPermissionByAcl(CheckAclParams),
    GetQuery(GetQueryParams),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::TransferPoolResources(_) => CommandKind::TransferPoolResources,
            Self::MountTable(_) => CommandKind::MountTable,
            Self::UnmountTable(_) => CommandKind::UnmountTable,
            Self::FreezeTable(_) => CommandKind::FreezeTable,
            Self::UnfreezeTable(_) => CommandKind::UnfreezeTable,
            Self::CheckPermission(_) => CommandKind::CheckPermission,
            Self::Set(_) => CommandKind::Set,
            Self::Remove(_) => CommandKind::Remove,
            Self::Get(_) => CommandKind::Get,
            Self::List(_) => CommandKind::List,
            Self::Exists(_) => CommandKind::Exists,
            Self::Copy(_) => CommandKind::Copy,
            Self::Move(_) => CommandKind::Move,
            Self::Merge(_) => CommandKind::Merge,
            Self::ExecuteBatch(_) => CommandKind::ExecuteBatch,
            Self::CheckPermissionByAcl(_) => CommandKind::CheckPermissionByAcl,
            Self::GetQuery(_) => CommandKind::GetQuery,
        }
    }

    pub fn base(&self) -> &BaseParams {
        match self {
            Self::TransferPoolResources(p) => &p.base,
            Self::MountTable(p)
            | Self::UnmountTable(p)
            | Self::FreezeTable(p)
            | Self::UnfreezeTable(p)
            | Self::Set(p)
            | Self::Remove(p)
            | Self::Exists(p) => &p.base,
            Self::CheckPermission(p) => &p.base,
            Self::Get(p) | Self::List(p) => &p.base,
            Self::Copy(p) | Self::Move(p) => &p.base,
            Self::Merge(p) => &p.base,
            Self::ExecuteBatch(p) => &p.base,
            Self::CheckPermissionByAcl(p) => &p.base,
            Self::GetQuery(p) => &p.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseParams {
        match self {
            Self::TransferPoolResources(p) => &mut p.base,
            Self::MountTable(p)
            | Self::UnmountTable(p)
            | Self::FreezeTable(p)
            | Self::UnfreezeTable(p)
            | Self::Set(p)
            | Self::Remove(p)
            | Self::Exists(p) => &mut p.base,
            Self::CheckPermission(p) => &mut p.base,
            Self::Get(p) | Self::List(p) => &mut p.base,
            Self::Copy(p) | Self::Move(p) => &mut p.base,
            Self::Merge(p) => &mut p.base,
            Self::ExecuteBatch(p) => &mut p.base,
            Self::CheckPermissionByAcl(p) => &mut p.base,
            Self::GetQuery(p) => &mut p.base,
        }
    }

    /// Serialize the parameter record to its wire object.
    pub fn parameters(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::TransferPoolResources(p) => serde_json::to_value(p),
            Self::MountTable(p)
            | Self::UnmountTable(p)
            | Self::FreezeTable(p)
            | Self::UnfreezeTable(p)
            | Self::Set(p)
            | Self::Remove(p)
            | Self::Exists(p) => serde_json::to_value(p),
            Self::CheckPermission(p) => serde_json::to_value(p),
            Self::Get(p) | Self::List(p) => serde_json::to_value(p),
            Self::Copy(p) | Self::Move(p) => serde_json::to_value(p),
            Self::Merge(p) => serde_json::to_value(p),
            Self::ExecuteBatch(p) => serde_json::to_value(p),
            Self::CheckPermissionByAcl(p) => serde_json::to_value(p),
            Self::GetQuery(p) => serde_json::to_value(p),
        }
    }

    /// Rebuild a command from its wire tag and parameter object.
    pub fn from_parts(kind: CommandKind, parameters: Value) -> Result<Self, ParseCommandError> {
        fn params<T: serde::de::DeserializeOwned>(
            kind: CommandKind,
            value: Value,
        ) -> Result<T, ParseCommandError> {
            serde_json::from_value(value)
                .map_err(|source| ParseCommandError::InvalidParameters { command: kind, source })
        }

        let command = match kind {
            CommandKind::TransferPoolResources => {
                Self::TransferPoolResources(params(kind, parameters)?)
            }
            CommandKind::MountTable => Self::MountTable(params(kind, parameters)?),
            CommandKind::UnmountTable => Self::UnmountTable(params(kind, parameters)?),
            CommandKind::FreezeTable => Self::FreezeTable(params(kind, parameters)?),
            CommandKind::UnfreezeTable => Self::UnfreezeTable(params(kind, parameters)?),
            CommandKind::CheckPermission => Self::CheckPermission(params(kind, parameters)?),
            CommandKind::Set => Self::Set(params(kind, parameters)?),
            CommandKind::Remove => Self::Remove(params(kind, parameters)?),
            CommandKind::Get => Self::Get(params(kind, parameters)?),
            CommandKind::List => Self::List(params(kind, parameters)?),
            CommandKind::Exists => Self::Exists(params(kind, parameters)?),
            CommandKind::Copy => Self::Copy(params(kind, parameters)?),
            CommandKind::Move => Self::Move(params(kind, parameters)?),
            CommandKind::Merge => Self::Merge(params(kind, parameters)?),
            CommandKind::ExecuteBatch => Self::ExecuteBatch(params(kind, parameters)?),
            CommandKind::CheckPermissionByAcl => {
                Self::CheckPermissionByAcl(params(kind, parameters)?)
            }
            CommandKind::GetQuery => Self::GetQuery(params(kind, parameters)?),
        };
        Ok(command)
    }
}

// ─── CommandKind ──────────────────────────────────────────────────────────────

/// The bare command tag, without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    TransferPoolResources,
    MountTable,
    UnmountTable,
    FreezeTable,
    UnfreezeTable,
    CheckPermission,
    Set,
    Remove,
    Get,
    List,
    Exists,
    Copy,
    Move,
    Merge,
    ExecuteBatch,
    CheckPermissionByAcl,
    GetQuery,
}

impl CommandKind {
    pub const ALL: [CommandKind; 17] = [
        Self::TransferPoolResources,
        Self::MountTable,
        Self::UnmountTable,
        Self::FreezeTable,
        Self::UnfreezeTable,
        Self::CheckPermission,
        Self::Set,
        Self::Remove,
        Self::Get,
        Self::List,
        Self::Exists,
        Self::Copy,
        Self::Move,
        Self::Merge,
        Self::ExecuteBatch,
        Self::CheckPermissionByAcl,
        Self::GetQuery,
    ];

    /// The wire tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TransferPoolResources => "transfer_pool_resources",
            Self::MountTable => "mount_table",
            Self::UnmountTable => "unmount_table",
            Self::FreezeTable => "freeze_table",
            Self::UnfreezeTable => "unfreeze_table",
            Self::CheckPermission => "check_permission",
            Self::Set => "set",
            Self::Remove => "remove",
            Self::Get => "get",
            Self::List => "list",
            Self::Exists => "exists",
            Self::Copy => "copy",
            Self::Move => "move",
            Self::Merge => "merge",
            Self::ExecuteBatch => "execute_batch",
            Self::CheckPermissionByAcl => "check_permission_by_acl",
            Self::GetQuery => "get_query",
        }
    }

    /// Structural shape of a successful output for this command.
    pub fn expected_output(self) -> OutputShape {
        match self {
            Self::Exists => OutputShape::Bool,
            Self::List | Self::ExecuteBatch => OutputShape::Array,
            // node id / operation id
            Self::Copy | Self::Move | Self::Merge => OutputShape::String,
            Self::CheckPermission | Self::CheckPermissionByAcl => OutputShape::Object,
            Self::Get
            | Self::GetQuery
            | Self::TransferPoolResources
            | Self::Set
            | Self::Remove
            | Self::MountTable
            | Self::UnmountTable
            | Self::FreezeTable
            | Self::UnfreezeTable => OutputShape::Any,
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ParseCommandError::UnknownCommand(s.to_string()))
    }
}

// ─── OutputShape ──────────────────────────────────────────────────────────────

/// JSON type a command's output is expected to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Any,
    Bool,
    String,
    Array,
    Object,
}

impl OutputShape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Bool => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

impl fmt::Display for OutputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Bool => "boolean",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// JSON type name of a value, for diagnostics.
pub fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
