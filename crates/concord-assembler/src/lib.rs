//! Concord Conflict Assembler
//!
//! Turns a conflict group into the ordered, size-bounded request the oracle
//! reads, and turns the oracle's free-text answer back into a structured
//! result.
//!
//! # Stages
//!
//! 1. [`ConflictAssembler`] strips references from the entries and enriches
//!    every unique URL once
//! 2. [`budget`] splits long evidence and entry lists into token-bounded chunks
//! 3. [`MessageBuilder`] renders the instruction template and evidence into
//!    messages, rejecting requests over the token ceiling
//! 4. [`parse_result`] extracts the verdict from the answer

#![warn(missing_docs)]

pub mod assembler;
pub mod budget;
pub mod config;
pub mod error;
pub mod messages;
pub mod parser;
pub mod templates;

pub use assembler::{ConflictAssembler, ConflictLinks, DEFAULT_ENRICH_CONCURRENCY};
pub use budget::{chunk_entries, chunk_text, count_message_tokens, TiktokenCounter};
pub use config::{BudgetConfig, PromptMode, PromptStyle};
pub use error::{AssemblyError, ParseError};
pub use messages::{flatten_messages, rebalance_pair, select_template, MessageBuilder, Preambles};
pub use parser::{extract_json_object, parse_object, parse_result};
pub use templates::{InstructionTemplate, TemplateContext, TemplateRegistry};
