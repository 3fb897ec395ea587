//! # Model Registry Operations
//!
//! Typed calls on the model chaincode. Models are registered with a content
//! id (an IPFS hash) and one input and one output tensor definition; the
//! chaincode fetches, stores and executes them. Execution input travels as
//! transient data under the `input` key, base64 text of the raw file.

use std::path::Path;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine as _;
use mlchain_core::ValidationError;
use mlchain_fabric::TransientData;
use serde::{Deserialize, Serialize};

use crate::connector::{Actor, Connector};
use crate::decode;
use crate::error::WorkflowError;

/// Tensor data types the model chaincode understands.
pub const TENSOR_TYPES: &[&str] = &[
    "float", "int32", "double", "int64", "uint32", "uint64", "bool", "complex", "complex64",
    "complex128", "half", "bfloat16", "int8", "int16", "uint8", "uint16",
];

/// Shape of a tensor as written in a definition file: `"1,28,28"` or `[1, 28, 28]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapeSpec {
    /// Comma-separated dimensions.
    Text(String),
    /// Dimension list.
    Dims(Vec<i64>),
}

impl ShapeSpec {
    fn to_arg(&self) -> Result<String, ValidationError> {
        let dims = match self {
            Self::Dims(dims) => dims.clone(),
            Self::Text(text) => text
                .split(',')
                .map(|d| d.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ValidationError::InvalidField("tensor shape", text.clone()))?,
        };
        if dims.is_empty() {
            return Err(ValidationError::Empty("tensor shape"));
        }
        Ok(dims
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(","))
    }
}

/// One tensor of a model signature, as supplied by the model developer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorDefinition {
    /// Operation name in the saved graph.
    pub name: String,
    /// Data type, one of [`TENSOR_TYPES`].
    pub datatype: String,
    /// Tensor shape.
    pub shape: ShapeSpec,
    /// Output index of the operation.
    pub idx: i64,
}

impl TensorDefinition {
    /// Read a definition from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, WorkflowError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::InvalidField("tensor definition file", format!("{}: {e}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ValidationError::InvalidField("tensor definition", format!("{}: {e}", path.display())).into()
        })
    }

    /// The four chaincode arguments: name, datatype, shape, idx.
    fn to_args(&self) -> Result<[String; 4], ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("tensor name"));
        }
        if !TENSOR_TYPES.contains(&self.datatype.as_str()) {
            return Err(ValidationError::InvalidField("tensor datatype", self.datatype.clone()));
        }
        Ok([
            self.name.clone(),
            self.datatype.clone(),
            self.shape.to_arg()?,
            self.idx.to_string(),
        ])
    }
}

/// A model to register.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    /// Model name, also its ledger key.
    pub name: String,
    /// Content id of the packaged model.
    pub cid: String,
    /// Input tensor.
    pub input: TensorDefinition,
    /// Output tensor.
    pub output: TensorDefinition,
}

impl ModelDefinition {
    fn to_args(&self) -> Result<Vec<String>, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Empty("model name"));
        }
        if self.cid.trim().is_empty() {
            return Err(ValidationError::Empty("content id"));
        }
        let mut args = vec![self.name.clone(), self.cid.clone()];
        args.extend(self.input.to_args()?);
        args.extend(self.output.to_args()?);
        Ok(args)
    }
}

/// A tensor as stored on the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorInfo {
    /// Operation name.
    pub name: String,
    /// Numeric data type code.
    pub datatype: i64,
    /// Dimensions.
    #[serde(default)]
    pub shape: Vec<i64>,
    /// Output index.
    pub idx: i64,
}

/// Public view of a registered model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model name.
    pub name: String,
    /// Input tensor.
    pub input: TensorInfo,
    /// Output tensor.
    pub output: TensorInfo,
}

/// Model chaincode client.
#[derive(Debug, Clone)]
pub struct ModelContract {
    connector: Connector,
}

impl ModelContract {
    /// Address the configured model chaincode.
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }

    /// Register a model. The acting identity must hold the `dev` role and
    /// enough tokens for the upload price; the chaincode enforces both.
    pub async fn save(&self, actor: &Actor, model: &ModelDefinition) -> Result<(), WorkflowError> {
        let args = model.to_args()?;
        let target = self.connector.model_target();
        self.connector
            .submit(actor, target, "SaveModel", args, None)
            .await?;
        tracing::info!(model = %model.name, cid = %model.cid, "model saved");
        Ok(())
    }

    /// Execute `name` on `input` and return the chaincode's textual result.
    pub async fn run(&self, actor: &Actor, name: &str, input: &[u8]) -> Result<String, WorkflowError> {
        let transient = TransientData::new().with("input", B64.encode(input).into_bytes());
        let target = self.connector.model_target();
        let payload = self
            .connector
            .submit(actor, target, "RunModel", vec![name.to_string()], Some(transient))
            .await?;
        decode::text("RunModel", &payload)
    }

    /// Allow the user with client id `user` to execute `name`.
    pub async fn authorize(&self, actor: &Actor, name: &str, user: &str) -> Result<(), WorkflowError> {
        let target = self.connector.model_target();
        self.connector
            .submit(actor, target, "Authorize", vec![name.to_string(), user.to_string()], None)
            .await?;
        Ok(())
    }

    /// One model by name.
    pub async fn get(&self, actor: &Actor, name: &str) -> Result<ModelRecord, WorkflowError> {
        let target = self.connector.model_target();
        let payload = self
            .connector
            .evaluate(actor, target, "GetModel", vec![name.to_string()])
            .await?;
        decode::json("GetModel", &payload)
    }

    /// Models uploaded by the developer with client id `developer`.
    pub async fn by_developer(&self, actor: &Actor, developer: &str) -> Result<Vec<ModelRecord>, WorkflowError> {
        let target = self.connector.model_target();
        let payload = self
            .connector
            .evaluate(actor, target, "GetModelsByDev", vec![developer.to_string()])
            .await?;
        decode::json_list("GetModelsByDev", &payload)
    }

    /// Every registered model.
    pub async fn all(&self, actor: &Actor) -> Result<Vec<ModelRecord>, WorkflowError> {
        let target = self.connector.model_target();
        let payload = self
            .connector
            .evaluate(actor, target, "GetAllModels", Vec::new())
            .await?;
        decode::json_list("GetAllModels", &payload)
    }
}
