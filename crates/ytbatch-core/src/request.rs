//! Request-side wire types: sub-requests and the batch envelope.
//!
//! Wire shape:
//! ```text
//! {"requests": [{"command": "get", "parameters": {"path": "//tmp/a"}, "setup": ...}, ...]}
//! ```

use serde::ser::{Error as _, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::command::{
    BaseParams, CheckAclParams, CheckPermissionParams, Command, CommandKind, CopyMoveParams,
    ExecuteBatchParams, GetQueryParams, MergeParams, MergeSpec, PathAttrParams, PathParams,
    TransferPoolQuotaParams,
};
use crate::error::ParseCommandError;

/// One command inside a batch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireSubRequest")]
pub struct SubRequest {
    pub command: Command,
    /// Command input body, e.g. the value written by `set`.
    pub input: Option<Value>,
    /// Free-form per-request setup forwarded untouched.
    pub setup: Option<Value>,
}

#[derive(Deserialize)]
struct WireSubRequest {
    command: String,
    parameters: Value,
    #[serde(default)]
    input: Option<Value>,
    #[serde(default)]
    setup: Option<Value>,
}

impl TryFrom<WireSubRequest> for SubRequest {
    type Error = ParseCommandError;

    fn try_from(wire: WireSubRequest) -> Result<Self, Self::Error> {
        let kind: CommandKind = wire.command.parse()?;
        Ok(Self {
            command: Command::from_parts(kind, wire.parameters)?,
            input: wire.input,
            setup: wire.setup,
        })
    }
}

impl Serialize for SubRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let parameters = self.command.parameters().map_err(S::Error::custom)?;
        let len = 2 + usize::from(self.input.is_some()) + usize::from(self.setup.is_some());
        let mut state = serializer.serialize_struct("SubRequest", len)?;
        state.serialize_field("command", self.kind().as_str())?;
        state.serialize_field("parameters", &parameters)?;
        if let Some(input) = &self.input {
            state.serialize_field("input", input)?;
        }
        if let Some(setup) = &self.setup {
            state.serialize_field("setup", setup)?;
        }
        state.end()
    }
}

impl From<Command> for SubRequest {
    fn from(command: Command) -> Self {
        Self { command, input: None, setup: None }
    }
}

impl SubRequest {
    pub fn new(command: Command) -> Self {
        command.into()
    }

    pub fn kind(&self) -> CommandKind {
        self.command.kind()
    }

    pub fn get(path: impl Into<String>) -> Self {
        Command::Get(PathAttrParams::new(path)).into()
    }

    pub fn get_with_attributes<I, S>(path: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Command::Get(PathAttrParams::new(path).attributes(attributes)).into()
    }

    pub fn list(path: impl Into<String>) -> Self {
        Command::List(PathAttrParams::new(path)).into()
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Command::Exists(PathParams::new(path)).into()
    }

    /// `set` with the written value as input.
    pub fn set(path: impl Into<String>, value: Value) -> Self {
        Self::new(Command::Set(PathParams::new(path))).with_input(value)
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Command::Remove(PathParams::new(path)).into()
    }

    pub fn mount_table(path: impl Into<String>) -> Self {
        Command::MountTable(PathParams::new(path)).into()
    }

    pub fn unmount_table(path: impl Into<String>) -> Self {
        Command::UnmountTable(PathParams::new(path)).into()
    }

    pub fn freeze_table(path: impl Into<String>) -> Self {
        Command::FreezeTable(PathParams::new(path)).into()
    }

    pub fn unfreeze_table(path: impl Into<String>) -> Self {
        Command::UnfreezeTable(PathParams::new(path)).into()
    }

    pub fn copy(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Command::Copy(CopyMoveParams::new(source, destination)).into()
    }

    pub fn move_node(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Command::Move(CopyMoveParams::new(source, destination)).into()
    }

    pub fn merge(spec: MergeSpec) -> Self {
        Command::Merge(MergeParams { spec, base: BaseParams::default() }).into()
    }

    pub fn check_permission(
        user: impl Into<String>,
        path: impl Into<String>,
        permission: impl Into<String>,
    ) -> Self {
        Command::CheckPermission(CheckPermissionParams {
            user: user.into(),
            path: path.into(),
            permission: permission.into(),
            base: BaseParams::default(),
        })
        .into()
    }

    pub fn check_permission_by_acl(params: CheckAclParams) -> Self {
        Command::CheckPermissionByAcl(params).into()
    }

    pub fn transfer_pool_resources(params: TransferPoolQuotaParams) -> Self {
        Command::TransferPoolResources(params).into()
    }

    pub fn get_query(query_id: impl Into<String>, stage: impl Into<String>) -> Self {
        Command::GetQuery(GetQueryParams {
            query_id: query_id.into(),
            stage: stage.into(),
            base: BaseParams::default(),
        })
        .into()
    }

    pub fn execute_batch(requests: Vec<SubRequest>) -> Self {
        Command::ExecuteBatch(ExecuteBatchParams { requests, base: BaseParams::default() }).into()
    }

    pub fn with_transaction(mut self, transaction_id: impl Into<String>) -> Self {
        self.command.base_mut().transaction_id = Some(transaction_id.into());
        self
    }

    pub fn with_ui_marker(mut self, marker: impl Into<String>) -> Self {
        self.command.base_mut().ui_marker = Some(marker.into());
        self
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_setup(mut self, setup: Value) -> Self {
        self.setup = Some(setup);
        self
    }
}

/// An ordered batch of sub-requests sent as one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchEnvelope {
    requests: Vec<SubRequest>,
}

impl BatchEnvelope {
    pub fn new(requests: Vec<SubRequest>) -> Self {
        Self { requests }
    }

    pub fn requests(&self) -> &[SubRequest] {
        &self.requests
    }

    pub fn into_requests(self) -> Vec<SubRequest> {
        self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubRequest> {
        self.requests.iter()
    }
}

impl<'a> IntoIterator for &'a BatchEnvelope {
    type Item = &'a SubRequest;
    type IntoIter = std::slice::Iter<'a, SubRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}
