//! Block-explorer transaction records
//!
//! Only the fields the correlation needs are modelled; everything else in the
//! explorer's response is ignored.

use serde::{Deserialize, Serialize};

/// One page of an address's transaction listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionPage {
    /// Total transactions the explorer reports for the address
    #[serde(rename = "totalItems", default)]
    pub total_items: usize,
    /// Transactions in this window
    #[serde(default)]
    pub items: Vec<Transaction>,
}

/// A transaction as listed by the block explorer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub vin: Vec<TxInput>,
    #[serde(default)]
    pub vout: Vec<TxOutput>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Sending address, absent for coinbase and non-standard inputs
    #[serde(default)]
    pub addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    #[serde(rename = "scriptPubKey", default)]
    pub script_pub_key: Option<ScriptPubKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPubKey {
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl Transaction {
    /// Sender of the transaction.
    ///
    /// Only the first input is consulted; later inputs are ignored.
    pub fn sender(&self) -> Option<&str> {
        self.vin.first()?.addr.as_deref()
    }

    /// Every address across every output, in listing order
    pub fn recipients(&self) -> impl Iterator<Item = &str> {
        self.vout
            .iter()
            .filter_map(|out| out.script_pub_key.as_ref())
            .flat_map(|script| script.addresses.iter().map(String::as_str))
    }

    /// Build a transaction from one sender and a list of single-address outputs
    #[cfg(test)]
    pub(crate) fn simple(sender: Option<&str>, recipients: &[&str]) -> Self {
        Self {
            txid: None,
            vin: vec![TxInput {
                addr: sender.map(str::to_string),
            }],
            vout: recipients
                .iter()
                .map(|addr| TxOutput {
                    script_pub_key: Some(ScriptPubKey {
                        addresses: vec![addr.to_string()],
                    }),
                })
                .collect(),
        }
    }
}
