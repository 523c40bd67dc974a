// =============================================================================
// LedgerGateway — capability contract wrapping the ledger SDK
// =============================================================================
//
// Out of scope per §1/§4.2: this module defines the contract collectors
// depend on, not a concrete Hedera SDK client. Implementers supply a type
// satisfying this trait (constructed from `network.{name,operator_id,
// operator_key}`, §6.3) and hand it to the collectors as an `Arc<dyn
// LedgerGateway>`.
// =============================================================================

use async_trait::async_trait;

/// One on-chain transaction type, per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TransactionType {
    CryptoTransfer,
    TokenTransfer,
    ContractCreate,
    ContractCall,
    ConsensusSubmitMessage,
    FileOperation,
    Unknown,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransactionType::CryptoTransfer => "CryptoTransfer",
            TransactionType::TokenTransfer => "TokenTransfer",
            TransactionType::ContractCreate => "ContractCreate",
            TransactionType::ContractCall => "ContractCall",
            TransactionType::ConsensusSubmitMessage => "ConsensusSubmitMessage",
            TransactionType::FileOperation => "FileOperation",
            TransactionType::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

/// Ledger-returned summary of one on-chain transaction affecting an account.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub timestamp_sec: i64,
    pub amount_tinybar: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub status: String,
}

/// A single consensus node's published identity and endpoints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeInfo {
    pub node_id: String,
    pub account_id: String,
    pub addresses: Vec<String>,
}

/// The ledger's published list of consensus-node identities and endpoints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NodeAddressBook {
    pub nodes: Vec<NodeInfo>,
}

/// Capability set a ledger SDK wrapper must supply (§4.2). Errors from any
/// call are per-call; the collector decides whether to skip one account and
/// continue, or abort the tick (§4.3).
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Balance of `account_id`, in tinybar.
    async fn get_account_balance(&self, account_id: &str) -> anyhow::Result<f64>;

    /// The last `limit` transaction records affecting `account_id`.
    async fn get_account_records(
        &self,
        account_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<TransactionRecord>>;

    /// The current consensus node address book.
    async fn get_node_address_book(&self) -> anyhow::Result<NodeAddressBook>;

    /// Release any resources (connections, file handles) held by the gateway.
    async fn close(&self);
}

/// Placeholder gateway for process wiring when no concrete SDK client has
/// been plugged in yet. Every call fails; it exists so the daemon binary
/// links and starts without a real Hedera SDK dependency, per §1's framing
/// of the SDK as an external collaborator this crate does not implement.
pub struct UnimplementedGateway;

#[async_trait]
impl LedgerGateway for UnimplementedGateway {
    async fn get_account_balance(&self, _account_id: &str) -> anyhow::Result<f64> {
        anyhow::bail!("no LedgerGateway implementation configured")
    }

    async fn get_account_records(&self, _account_id: &str, _limit: usize) -> anyhow::Result<Vec<TransactionRecord>> {
        anyhow::bail!("no LedgerGateway implementation configured")
    }

    async fn get_node_address_book(&self) -> anyhow::Result<NodeAddressBook> {
        anyhow::bail!("no LedgerGateway implementation configured")
    }

    async fn close(&self) {}
}
