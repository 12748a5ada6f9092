// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook decisions and their aggregation.

/// What a hook decided about one tool event.
///
/// `proceed = false` vetoes the host operation; the message accompanies
/// either outcome and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub proceed: bool,
    pub message: String,
}

impl Decision {
    /// Allow the operation with an annotation.
    pub fn allow(message: impl Into<String>) -> Self {
        Self {
            proceed: true,
            message: message.into(),
        }
    }

    /// Allow the operation with no annotation.
    pub fn silent() -> Self {
        Self {
            proceed: true,
            message: String::new(),
        }
    }

    /// Veto the operation.
    pub fn block(message: impl Into<String>) -> Self {
        Self {
            proceed: false,
            message: message.into(),
        }
    }

    /// Fold a sequence of per-hook decisions into one.
    ///
    /// The aggregate proceeds only if every decision proceeds; messages are
    /// joined with a single newline, skipping empty segments, in invocation
    /// order.
    pub fn aggregate<I: IntoIterator<Item = Decision>>(decisions: I) -> Decision {
        let mut proceed = true;
        let mut messages: Vec<String> = Vec::new();
        for decision in decisions {
            proceed = proceed && decision.proceed;
            if !decision.message.is_empty() {
                messages.push(decision.message);
            }
        }
        Decision {
            proceed,
            message: messages.join("\n"),
        }
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
