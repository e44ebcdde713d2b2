//! Batchcall engine: many independently addressed calls in one round trip.
//!
//! Every command of every group is flattened, in submission order, into a
//! single `system.multicall` request. The server answers with one entry per
//! call and no tags, so the response is consumed strictly positionally and
//! any count mismatch is an [`AlignmentError`].
//!
//! Commands are written the way rTorrent spells them on its command line,
//! `method=target,arg,...`. The first argument is the instance selector
//! (an info-hash for `d.*`, `t.*`, `p.*` commands). It is kept apart from
//! the other arguments so record keys never depend on its shape.

use super::caller::Caller;
use super::codec;
use super::command::{Command, strip_namespace, to_key};
use super::error::{AlignmentError, DecodeError, RpcError, RpcResult};
use super::multicall::{ResultRecord, zip_row};
use super::transport::Transport;
use super::value::{Record, Value};

/// Server method bundling several calls into one.
pub const SYSTEM_MULTICALL: &str = "system.multicall";

/// One fully resolved remote invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSpec {
    /// Method to invoke.
    pub method_name: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl CallSpec {
    /// The `{methodName, params}` struct expected inside `system.multicall`.
    pub fn to_value(&self) -> Value {
        let mut record = Record::new();
        record.insert("methodName", Value::from(self.method_name.as_str()));
        record.insert("params", Value::List(self.params.clone()));
        Value::Record(record)
    }
}

/// How a command's result is shaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultShape {
    /// A plain value.
    Scalar,
    /// The command is itself a multicall: a list of rows, each zipped
    /// against these sub-command keys.
    NestedRows {
        /// Keys of the sub-commands, in request order.
        keys: Vec<String>,
    },
}

/// A command submitted inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCommand {
    method: String,
    target: Option<String>,
    args: Vec<String>,
    key: String,
    shape: ResultShape,
}

impl BatchCommand {
    /// Parse `method`, `method=target` or `method=target,arg,...`.
    ///
    /// Arguments exist only when the command contains `=`; they are split on
    /// commas and the first one is taken as the instance selector.
    pub fn parse(command: &str) -> Self {
        match command.split_once('=') {
            None => Self::global(command, Vec::<String>::new()),
            Some((method, rest)) => {
                let mut parts = rest.split(',').map(str::to_string);
                let target = parts.next().unwrap_or_default();
                Self::build(method.to_string(), Some(target), parts.collect())
            }
        }
    }

    /// Parse a list of command strings.
    pub fn parse_all<I, S>(commands: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        commands
            .into_iter()
            .map(|command| Self::parse(command.as_ref()))
            .collect()
    }

    /// A command addressed at an explicit entity.
    pub fn targeted<S: Into<String>>(
        method: impl Into<String>,
        target: impl Into<String>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::build(
            method.into(),
            Some(target.into()),
            args.into_iter().map(Into::into).collect(),
        )
    }

    /// A command without an instance selector.
    pub fn global<S: Into<String>>(
        method: impl Into<String>,
        args: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::build(method.into(), None, args.into_iter().map(Into::into).collect())
    }

    fn build(method: String, target: Option<String>, args: Vec<String>) -> Self {
        let field = strip_namespace(&method);
        let (key, shape) = if field.starts_with("multicall") {
            // Positional layout: target, filter, sub-commands...
            let keys = args
                .iter()
                .skip(1)
                .map(|sub| to_key(strip_namespace(sub)))
                .collect();
            (to_key(field), ResultShape::NestedRows { keys })
        } else if args.is_empty() {
            (to_key(field), ResultShape::Scalar)
        } else {
            (
                to_key(&format!("{}={}", field, args.join(","))),
                ResultShape::Scalar,
            )
        };
        Self {
            method,
            target,
            args,
            key,
            shape,
        }
    }

    /// Remote method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Instance selector, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Arguments after the selector.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Record key the result is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Expected result shape.
    pub fn shape(&self) -> &ResultShape {
        &self.shape
    }

    /// Resolve into the invocation sent inside the batch.
    pub fn call_spec(&self) -> CallSpec {
        let params = self
            .target
            .iter()
            .chain(self.args.iter())
            .map(|arg| Value::from(arg.as_str()))
            .collect();
        CallSpec {
            method_name: self.method.clone(),
            params,
        }
    }
}

impl From<&str> for BatchCommand {
    fn from(command: &str) -> Self {
        Self::parse(command)
    }
}

/// The first argument of a [`Command`] is its instance selector. Literal
/// arguments written into the field (`custom=comment`) follow the selector.
impl From<&Command> for BatchCommand {
    fn from(command: &Command) -> Self {
        let (name, inline) = match command.field.split_once('=') {
            Some((name, inline)) => (name, inline),
            None => (command.field.as_str(), ""),
        };
        let method = format!("{}{}", command.prefix, name);
        let inline = inline.split(',').filter(|arg| !arg.is_empty()).map(str::to_string);

        let mut args = command.args.iter().cloned();
        match args.next() {
            Some(target) => Self::targeted(method, target, inline.chain(args)),
            None => Self::global(method, inline),
        }
    }
}

/// Build the single `system.multicall` parameter for `specs`.
pub fn batch_request(specs: &[CallSpec]) -> Value {
    Value::List(specs.iter().map(CallSpec::to_value).collect())
}

/// Redistribute a `system.multicall` result into one record per group.
///
/// Entries are consumed in submission order. The total entry count must
/// equal the number of submitted commands.
pub fn demultiplex<G: AsRef<[BatchCommand]>>(
    groups: &[G],
    result: &Value,
) -> RpcResult<Vec<ResultRecord>> {
    let entries = result.as_list().ok_or_else(|| {
        DecodeError::UnexpectedShape(format!(
            "{} result is a {}, not a list",
            SYSTEM_MULTICALL,
            result.kind()
        ))
    })?;
    let expected: usize = groups.iter().map(|group| group.as_ref().len()).sum();
    if entries.len() != expected {
        return Err(AlignmentError::new("batchcall", expected, entries.len()).into());
    }

    let actual = entries.len();
    let mut entries = entries.iter().enumerate();
    let mut records = Vec::with_capacity(groups.len());
    for group in groups {
        let mut record = Record::new();
        for command in group.as_ref() {
            let (index, entry) = entries
                .next()
                .ok_or_else(|| AlignmentError::new("batchcall", expected, actual))?;
            let value = unwrap_entry(index, command, entry)?;
            let value = match command.shape() {
                ResultShape::Scalar => value,
                ResultShape::NestedRows { keys } => nested_rows(command, keys, &value)?,
            };
            if record.insert(command.key(), value).is_some() {
                tracing::warn!(key = command.key(), "duplicate key in batch group, keeping the last one");
            }
        }
        records.push(record);
    }
    Ok(records)
}

/// Unwrap one `system.multicall` entry: a one-element list holds the
/// result, a struct with `faultCode` is a per-call fault.
fn unwrap_entry(index: usize, command: &BatchCommand, entry: &Value) -> RpcResult<Value> {
    if let Some(fault) = codec::fault_from_value(entry) {
        tracing::warn!(index, method = command.method(), code = fault.code, "batched call faulted");
        return Err(RpcError::CallFault {
            index,
            method: command.method().to_string(),
            fault,
        });
    }
    match entry {
        Value::List(items) if items.len() == 1 => Ok(items[0].clone()),
        other => Ok(other.clone()),
    }
}

fn nested_rows(command: &BatchCommand, keys: &[String], value: &Value) -> RpcResult<Value> {
    let rows = value.as_list().ok_or_else(|| {
        DecodeError::UnexpectedShape(format!(
            "{} result is a {}, not a list of rows",
            command.method(),
            value.kind()
        ))
    })?;
    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            zip_row(keys, row, &format!("{} row {}", command.method(), i)).map(Value::Record)
        })
        .collect::<RpcResult<Vec<_>>>()?;
    Ok(Value::List(records))
}

impl<T: Transport> Caller<T> {
    /// Run `commands` in one round trip and collect them into one record.
    ///
    /// ```no_run
    /// # async fn demo() -> rtorrent_rpc::rpc::RpcResult<()> {
    /// use rtorrent_rpc::rpc::{BatchCommand, Caller, ScgiTransport};
    /// let caller = Caller::new(ScgiTransport::tcp("127.0.0.1:5000"));
    /// let hash = "0123456789ABCDEF0123456789ABCDEF01234567";
    /// let torrent = caller
    ///     .batchcall(&[
    ///         BatchCommand::targeted("d.name", hash, Vec::<String>::new()),
    ///         BatchCommand::targeted("d.state", hash, Vec::<String>::new()),
    ///     ])
    ///     .await?;
    /// println!("{:?}", torrent.get("name"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn batchcall(&self, commands: &[BatchCommand]) -> RpcResult<ResultRecord> {
        if commands.is_empty() {
            return Ok(Record::new());
        }
        let mut records = self.batchcall_groups(&[commands]).await?;
        records
            .pop()
            .ok_or_else(|| AlignmentError::new("batchcall", 1, 0).into())
    }

    /// Run every group in one round trip and build one record per group.
    pub async fn batchcall_groups<G: AsRef<[BatchCommand]>>(
        &self,
        groups: &[G],
    ) -> RpcResult<Vec<ResultRecord>> {
        let specs: Vec<CallSpec> = groups
            .iter()
            .flat_map(|group| group.as_ref().iter().map(BatchCommand::call_spec))
            .collect();
        if specs.is_empty() {
            return Ok(groups.iter().map(|_| Record::new()).collect());
        }

        let result = self
            .call(SYSTEM_MULTICALL, &[batch_request(&specs)])
            .await?;
        let records = demultiplex(groups, &result)?;
        tracing::debug!(calls = specs.len(), groups = records.len(), "batchcall decoded");
        Ok(records)
    }
}
