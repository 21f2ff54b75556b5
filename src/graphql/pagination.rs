//! Cursor-based pagination types for GraphQL
//!
//! Implements the Relay Connection specification on top of keyset paging.
//! A cursor is the base64 of `cursor:<row id>`; the repository resolves the
//! id to its `(created_at, id)` keyset.
//!
//! Usage: Use the `define_connection!` macro to create type-specific connections.

use async_graphql::SimpleObject;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::db::{PageDirection, PageWindow};

/// Page size when neither `first` nor `last` is given
pub const DEFAULT_PAGE_SIZE: i64 = 25;
/// Upper bound for `first` / `last`
pub const MAX_PAGE_SIZE: i64 = 100;

/// Information about pagination in a connection
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    /// When paginating forwards, are there more items?
    pub has_next_page: bool,
    /// When paginating backwards, are there more items?
    pub has_previous_page: bool,
    /// Cursor of the first item in this page
    pub start_cursor: Option<String>,
    /// Cursor of the last item in this page
    pub end_cursor: Option<String>,
}

/// Relay paging arguments
#[derive(Debug, Clone, Default)]
pub struct PageArgs {
    pub after: Option<String>,
    pub before: Option<String>,
    pub first: Option<i32>,
    pub last: Option<i32>,
}

/// An edge in a connection, containing a node and cursor (internal use)
#[derive(Debug, Clone)]
pub struct Edge<T> {
    pub node: T,
    pub cursor: String,
}

/// A paginated connection result (internal use)
#[derive(Debug, Clone)]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
}

/// Macro to define a GraphQL connection type for a specific entity
///
/// Usage:
/// ```ignore
/// define_connection!(MessageConnection, MessageEdge, Message);
/// ```
#[macro_export]
macro_rules! define_connection {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            /// The item at the end of the edge
            pub node: $node_type,
            /// A cursor for pagination
            pub cursor: String,
        }

        /// Connection containing edges and page info
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $conn_name {
            pub edges: Vec<$edge_name>,
            pub page_info: $crate::graphql::pagination::PageInfo,
        }

        impl $conn_name {
            /// Create from a generic Connection
            pub fn from_connection(
                conn: $crate::graphql::pagination::Connection<$node_type>,
            ) -> Self {
                Self {
                    edges: conn
                        .edges
                        .into_iter()
                        .map(|e| $edge_name {
                            node: e.node,
                            cursor: e.cursor,
                        })
                        .collect(),
                    page_info: conn.page_info,
                }
            }
        }
    };
}

impl<T> Connection<T> {
    /// Build a connection from one keyset page.
    ///
    /// `items` are in ascending order; `has_more` says whether rows exist past
    /// the page in the direction of travel. The opposite side has rows exactly
    /// when the page started from an anchor.
    pub fn from_page(
        items: Vec<T>,
        has_more: bool,
        window: &PageWindow,
        id_of: impl Fn(&T) -> &str,
    ) -> Self {
        let anchored = window.anchor_id.is_some();
        let (has_next_page, has_previous_page) = match window.direction {
            PageDirection::Forward => (has_more, anchored),
            PageDirection::Backward => (anchored, has_more),
        };

        let edges: Vec<Edge<T>> = items
            .into_iter()
            .map(|node| Edge {
                cursor: encode_cursor(id_of(&node)),
                node,
            })
            .collect();

        let page_info = PageInfo {
            has_next_page,
            has_previous_page,
            start_cursor: edges.first().map(|e| e.cursor.clone()),
            end_cursor: edges.last().map(|e| e.cursor.clone()),
        };

        Self { edges, page_info }
    }
}

/// Encode a row id as a cursor string
pub fn encode_cursor(id: &str) -> String {
    BASE64.encode(format!("cursor:{}", id))
}

/// Decode a cursor string to a row id
pub fn decode_cursor(cursor: &str) -> Result<String, &'static str> {
    let decoded = BASE64.decode(cursor).map_err(|_| "invalid cursor format")?;

    let s = String::from_utf8(decoded).map_err(|_| "invalid cursor encoding")?;

    match s.strip_prefix("cursor:") {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        Some(_) => Err("invalid cursor value"),
        None => Err("invalid cursor prefix"),
    }
}

fn page_size(count: Option<i32>) -> Result<i64, &'static str> {
    match count {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(n) if n < 0 => Err("page size must not be negative"),
        Some(n) => Ok((n as i64).min(MAX_PAGE_SIZE)),
    }
}

/// Translate Relay arguments into a keyset window
pub fn parse_page_args(args: &PageArgs) -> Result<PageWindow, &'static str> {
    if args.first.is_some() && args.last.is_some() {
        return Err("first and last cannot be combined");
    }
    if args.after.is_some() && args.before.is_some() {
        return Err("after and before cannot be combined");
    }

    let backward = args.last.is_some() || args.before.is_some();
    if backward && (args.first.is_some() || args.after.is_some()) {
        return Err("forward and backward arguments cannot be mixed");
    }

    if backward {
        Ok(PageWindow {
            direction: PageDirection::Backward,
            anchor_id: args.before.as_deref().map(decode_cursor).transpose()?,
            limit: page_size(args.last)?,
        })
    } else {
        Ok(PageWindow {
            direction: PageDirection::Forward,
            anchor_id: args.after.as_deref().map(decode_cursor).transpose()?,
            limit: page_size(args.first)?,
        })
    }
}
