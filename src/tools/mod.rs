//! # Tool Registry
//!
//! The fixed set of Solscan tools this server exposes. Each [`ToolKind`] maps
//! to exactly one [`ToolDefinition`] through an exhaustive match, so adding a
//! tool means adding a variant and a table entry; nothing is looked up by
//! reflection or registered at runtime.
//!
//! ## Available Tools
//!
//! - `get-token-info` - Token metadata (`/v2.0/token/meta`)
//! - `get-sol-token-price` - Token price history (`/v2.0/token/price`)
//! - `get-latest-blocks` - Most recent blocks (`/v2.0/block/last`)
//! - `get-account-info` - Token accounts held by an address (`/v2.0/account/token-accounts`)
//! - `get-account-activities` - DeFi activities of an address (`/v2.0/account/defi/activities`)

use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::solscan::models::ToolError;

mod validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    TokenInfo,
    TokenPrice,
    LatestBlocks,
    AccountInfo,
    AccountActivities,
}

/// Shape of a successful upstream payload, which decides how streaming
/// transports split it into events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    SingleObject,
    PaginatedList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer { min: i64, max: Option<i64> },
    Enum(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Integer(i64),
    Str(&'static str),
}

impl DefaultValue {
    fn to_query(self) -> String {
        match self {
            DefaultValue::Integer(n) => n.to_string(),
            DefaultValue::Str(s) => s.to_string(),
        }
    }

    fn to_json(self) -> Value {
        match self {
            DefaultValue::Integer(n) => json!(n),
            DefaultValue::Str(s) => json!(s),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Alternative argument names accepted for this parameter.
    pub aliases: &'static [&'static str],
    /// Query string key sent to Solscan.
    pub upstream_key: &'static str,
    pub kind: ParamType,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct ToolDefinition {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    pub endpoint: &'static str,
    /// Query pairs sent on every call regardless of arguments.
    pub fixed_query: &'static [(&'static str, &'static str)],
    pub params: &'static [ParamSpec],
    pub response: ResponseKind,
}

const PAGE: ParamSpec = ParamSpec {
    name: "page",
    aliases: &[],
    upstream_key: "page",
    kind: ParamType::Integer { min: 1, max: None },
    required: false,
    default: Some(DefaultValue::Integer(1)),
    description: "Page number (1-based)",
};

const PAGE_SIZE: ParamSpec = ParamSpec {
    name: "page_size",
    aliases: &[],
    upstream_key: "page_size",
    kind: ParamType::Integer {
        min: 1,
        max: Some(100),
    },
    required: false,
    default: Some(DefaultValue::Integer(10)),
    description: "Number of items per page",
};

static TOKEN_INFO: ToolDefinition = ToolDefinition {
    kind: ToolKind::TokenInfo,
    name: "get-token-info",
    description: "Get detailed token metadata for a contract address from Solscan",
    endpoint: "/v2.0/token/meta",
    fixed_query: &[],
    params: &[ParamSpec {
        name: "contract_address",
        aliases: &["address"],
        upstream_key: "address",
        kind: ParamType::String,
        required: true,
        default: None,
        description: "Token address on Solana blockchain",
    }],
    response: ResponseKind::SingleObject,
};

static TOKEN_PRICE: ToolDefinition = ToolDefinition {
    kind: ToolKind::TokenPrice,
    name: "get-sol-token-price",
    description: "Get Solana token price information from Solscan",
    endpoint: "/v2.0/token/price",
    fixed_query: &[],
    params: &[ParamSpec {
        name: "contract_address",
        aliases: &["address"],
        upstream_key: "address",
        kind: ParamType::String,
        required: true,
        default: None,
        description: "Token address on Solana blockchain",
    }],
    response: ResponseKind::SingleObject,
};

static LATEST_BLOCKS: ToolDefinition = ToolDefinition {
    kind: ToolKind::LatestBlocks,
    name: "get-latest-blocks",
    description: "Get the latest Solana blocks from Solscan",
    endpoint: "/v2.0/block/last",
    fixed_query: &[],
    params: &[ParamSpec {
        name: "limit",
        aliases: &[],
        upstream_key: "limit",
        kind: ParamType::Integer {
            min: 1,
            max: Some(100),
        },
        required: false,
        default: Some(DefaultValue::Integer(10)),
        description: "Number of latest blocks to return",
    }],
    response: ResponseKind::PaginatedList,
};

static ACCOUNT_INFO: ToolDefinition = ToolDefinition {
    kind: ToolKind::AccountInfo,
    name: "get-account-info",
    description: "Get token accounts information for a Solana address",
    endpoint: "/v2.0/account/token-accounts",
    fixed_query: &[("type", "token")],
    params: &[
        ParamSpec {
            name: "account_address",
            aliases: &["address"],
            upstream_key: "address",
            kind: ParamType::String,
            required: true,
            default: None,
            description: "Solana account address",
        },
        PAGE,
        PAGE_SIZE,
    ],
    response: ResponseKind::SingleObject,
};

static ACCOUNT_ACTIVITIES: ToolDefinition = ToolDefinition {
    kind: ToolKind::AccountActivities,
    name: "get-account-activities",
    description: "Get DeFi activities for a Solana address",
    endpoint: "/v2.0/account/defi/activities",
    fixed_query: &[],
    params: &[
        ParamSpec {
            name: "account_address",
            aliases: &["address"],
            upstream_key: "address",
            kind: ParamType::String,
            required: true,
            default: None,
            description: "Solana account address",
        },
        ParamSpec {
            name: "activity_type",
            aliases: &[],
            upstream_key: "activity_type",
            kind: ParamType::String,
            required: false,
            default: None,
            description: "Only return activities of this type",
        },
        PAGE,
        PAGE_SIZE,
        ParamSpec {
            name: "sort_by",
            aliases: &[],
            upstream_key: "sort_by",
            kind: ParamType::Enum(&["block_time"]),
            required: false,
            default: Some(DefaultValue::Str("block_time")),
            description: "Field to sort by",
        },
        ParamSpec {
            name: "sort_order",
            aliases: &[],
            upstream_key: "sort_order",
            kind: ParamType::Enum(&["asc", "desc"]),
            required: false,
            default: Some(DefaultValue::Str("desc")),
            description: "Sort order (asc or desc)",
        },
    ],
    response: ResponseKind::PaginatedList,
};

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::TokenInfo,
        ToolKind::TokenPrice,
        ToolKind::LatestBlocks,
        ToolKind::AccountInfo,
        ToolKind::AccountActivities,
    ];

    pub fn definition(self) -> &'static ToolDefinition {
        match self {
            ToolKind::TokenInfo => &TOKEN_INFO,
            ToolKind::TokenPrice => &TOKEN_PRICE,
            ToolKind::LatestBlocks => &LATEST_BLOCKS,
            ToolKind::AccountInfo => &ACCOUNT_INFO,
            ToolKind::AccountActivities => &ACCOUNT_ACTIVITIES,
        }
    }

    pub fn name(self) -> &'static str {
        self.definition().name
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Resolves a tool name to its definition.
pub fn lookup(name: &str) -> Result<&'static ToolDefinition, ToolError> {
    name.parse::<ToolKind>().map(ToolKind::definition)
}

/// All definitions in registry order.
pub fn all() -> impl Iterator<Item = &'static ToolDefinition> {
    ToolKind::ALL.into_iter().map(ToolKind::definition)
}

impl ToolDefinition {
    /// JSON Schema advertised through MCP `tools/list`.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in self.params {
            let mut prop = match param.kind {
                ParamType::String => json!({ "type": "string" }),
                ParamType::Integer { min, max } => {
                    let mut p = json!({ "type": "integer", "minimum": min });
                    if let Some(max) = max {
                        p["maximum"] = json!(max);
                    }
                    p
                }
                ParamType::Enum(values) => json!({ "type": "string", "enum": values }),
            };
            prop["description"] = json!(param.description);
            if let Some(default) = param.default {
                prop["default"] = default.to_json();
            }
            properties.insert(param.name.to_string(), prop);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// MCP `tools/list` entry.
    pub fn describe(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema(),
        })
    }
}
