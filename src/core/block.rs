use crate::core::monetary::{BLOCK_BITS, BLOCK_VERSION};
use crate::core::witness::witness_commitment;
use crate::core::{BlockTemplate, CandidateTxn, CapacityPolicy, CoinbaseTxn, MerkleTree, ProofOfWork};
use crate::error::{MinerError, Result};
use crate::utils::{double_sha256, encode_hex, to_display_hex, Hash, ZERO_HASH};
use log::{info, warn};

/// 80-byte block header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

impl BlockHeader {
    pub const SIZE: usize = 80;

    /// Header with the fixed version and bits, a zero previous-block hash and nonce 0
    pub fn new(merkle_root: Hash, timestamp: u32) -> BlockHeader {
        BlockHeader {
            version: BLOCK_VERSION,
            prev_block_hash: ZERO_HASH,
            merkle_root,
            timestamp,
            bits: BLOCK_BITS,
            nonce: 0,
        }
    }

    pub fn with_nonce(&self, nonce: u32) -> BlockHeader {
        BlockHeader { nonce, ..*self }
    }

    pub fn serialize(&self) -> [u8; Self::SIZE] {
        let mut out = [0u8; Self::SIZE];
        out[0..4].copy_from_slice(&self.version.to_le_bytes());
        out[4..36].copy_from_slice(&self.prev_block_hash);
        out[36..68].copy_from_slice(&self.merkle_root);
        out[68..72].copy_from_slice(&self.timestamp.to_le_bytes());
        out[72..76].copy_from_slice(&self.bits.to_le_bytes());
        out[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        out
    }

    /// Double SHA-256 of the serialized header, internal byte order
    pub fn hash(&self) -> Hash {
        double_sha256(&self.serialize())
    }
}

/// Inputs to block assembly that do not come from the mempool
#[derive(Debug, Clone)]
pub struct AssemblyParams {
    pub block_height: u64,
    pub timestamp: u32,
    pub payout_script: Vec<u8>,
    pub coinbase_tag: Vec<u8>,
    pub capacity: u64,
    pub policy: CapacityPolicy,
}

/// A fully assembled block waiting for its nonce
#[derive(Debug, Clone)]
pub struct BlockCandidate {
    header: BlockHeader,
    coinbase: CoinbaseTxn,
    template: BlockTemplate,
    txids: Vec<Hash>,
}

impl BlockCandidate {
    /// Select transactions, build the coinbase and compute the header's merkle root
    pub fn assemble(candidates: Vec<CandidateTxn>, params: &AssemblyParams) -> Result<BlockCandidate> {
        if candidates.is_empty() {
            warn!("No transactions available, the block will only contain the coinbase");
        }

        let template = BlockTemplate::select(candidates, params.capacity, params.policy)?;
        let total_fees = u64::try_from(template.get_total_fee()).map_err(|_| {
            MinerError::Template(format!(
                "selected transactions have a negative total fee ({})",
                template.get_total_fee()
            ))
        })?;

        let wtxids: Vec<Hash> = template.get_transactions().iter().map(|tx| tx.wtxid).collect();
        let commitment = witness_commitment(&wtxids)?;
        info!("Witness commitment: {}", encode_hex(&commitment));

        let coinbase = CoinbaseTxn::build(
            params.block_height,
            total_fees,
            &commitment,
            &params.payout_script,
            &params.coinbase_tag,
        )?;

        let mut txids = Vec::with_capacity(template.get_transactions().len() + 1);
        txids.push(coinbase.get_txid());
        txids.extend(template.get_transactions().iter().map(|tx| tx.txid));

        let merkle_root = MerkleTree::calculate_merkle_root(&txids)?;
        info!("Merkle root: {}", encode_hex(&merkle_root));

        Ok(BlockCandidate {
            header: BlockHeader::new(merkle_root, params.timestamp),
            coinbase,
            template,
            txids,
        })
    }

    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_coinbase(&self) -> &CoinbaseTxn {
        &self.coinbase
    }

    pub fn get_template(&self) -> &BlockTemplate {
        &self.template
    }

    /// Coinbase txid first, then the selected transactions in template order
    pub fn get_txids(&self) -> &[Hash] {
        self.txids.as_slice()
    }

    /// Search for a nonce meeting `target`, using `workers` threads
    pub fn mine(self, target: &Hash, workers: usize) -> Result<Block> {
        let timestamp = self.header.timestamp;
        info!("Starting proof-of-work for block with timestamp {timestamp}");
        let pow = ProofOfWork::new_proof_of_work(self.header, target);
        let (nonce, hash) = pow.run_parallel(workers)?;
        info!("Proof-of-work completed for block: {}", to_display_hex(&hash));

        Ok(Block {
            header: self.header.with_nonce(nonce),
            hash,
            coinbase: self.coinbase,
            template: self.template,
            txids: self.txids,
        })
    }
}

/// A block whose header meets the target
#[derive(Debug, Clone)]
pub struct Block {
    header: BlockHeader,
    hash: Hash,
    coinbase: CoinbaseTxn,
    template: BlockTemplate,
    txids: Vec<Hash>,
}

impl Block {
    pub fn get_header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn get_hash(&self) -> Hash {
        self.hash
    }

    pub fn get_coinbase(&self) -> &CoinbaseTxn {
        &self.coinbase
    }

    pub fn get_template(&self) -> &BlockTemplate {
        &self.template
    }

    pub fn get_txids(&self) -> &[Hash] {
        self.txids.as_slice()
    }

    /// Header hex, segwit coinbase hex, then one display-order txid per line
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.txids.len() + 2);
        lines.push(encode_hex(&self.header.serialize()));
        lines.push(encode_hex(&self.coinbase.segwit_bytes()));
        lines.extend(self.txids.iter().map(to_display_hex));

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::monetary::MAX_BLOCK_WEIGHT;
    use crate::testnet::test_utils::{
        legacy_record, segwit_record, GENESIS_COINBASE_HEX, GENESIS_HEADER_HEX,
    };
    use crate::core::TransactionRecord;
    use crate::utils::{decode_hex, from_display_hex};

    const EASIEST: Hash = [0xff; 32];

    fn params() -> AssemblyParams {
        AssemblyParams {
            block_height: 840_000,
            timestamp: 1_713_571_767,
            payout_script: vec![0x51],
            coinbase_tag: b"test".to_vec(),
            capacity: MAX_BLOCK_WEIGHT,
            policy: CapacityPolicy::ReserveOnly,
        }
    }

    #[test]
    fn test_genesis_header_serialization_and_hash() {
        let genesis_tx =
            TransactionRecord::from_bytes(&decode_hex(GENESIS_COINBASE_HEX).unwrap()).unwrap();
        let merkle_root = MerkleTree::calculate_merkle_root(&[genesis_tx.txid()]).unwrap();

        let header = BlockHeader {
            version: 1,
            prev_block_hash: ZERO_HASH,
            merkle_root,
            timestamp: 1_231_006_505,
            bits: 0x1d00ffff,
            nonce: 2_083_236_893,
        };

        assert_eq!(encode_hex(&header.serialize()), GENESIS_HEADER_HEX);
        assert_eq!(
            header.hash(),
            from_display_hex("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f")
                .unwrap()
        );
    }

    #[test]
    fn test_header_defaults() {
        let header = BlockHeader::new([1u8; 32], 42);
        let bytes = header.serialize();
        assert_eq!(&bytes[0..4], &[0x07, 0, 0, 0]);
        assert!(bytes[4..36].iter().all(|b| *b == 0));
        assert_eq!(&bytes[72..76], &[0xff, 0xff, 0x00, 0x1f]);
        assert_eq!(header.with_nonce(9).serialize()[76..], [9, 0, 0, 0]);
    }

    #[test]
    fn test_empty_mempool_yields_coinbase_only_block() {
        let candidate = BlockCandidate::assemble(vec![], &params()).unwrap();

        assert_eq!(candidate.get_txids().len(), 1);
        assert_eq!(candidate.get_txids()[0], candidate.get_coinbase().get_txid());
        assert_eq!(candidate.get_header().merkle_root, candidate.get_coinbase().get_txid());
    }

    #[test]
    fn test_single_legacy_transaction_block() {
        let tx = legacy_record(100_000, 99_000);
        let candidates = vec![tx.to_candidate("tx.json").unwrap()];
        let candidate = BlockCandidate::assemble(candidates, &params()).unwrap();

        assert_eq!(candidate.get_template().get_transactions().len(), 1);
        assert_eq!(candidate.get_coinbase().get_record().vout[0].value, 312_500_000 + 1_000);
        assert_eq!(candidate.get_txids(), &[candidate.get_coinbase().get_txid(), tx.txid()]);
        assert_eq!(
            candidate.get_header().merkle_root,
            MerkleTree::hash_pair(&candidate.get_coinbase().get_txid(), &tx.txid())
        );
    }

    #[test]
    fn test_commitment_uses_wtxids() {
        let tx = segwit_record();
        let candidates = vec![tx.to_candidate("sw.json").unwrap()];
        let candidate = BlockCandidate::assemble(candidates, &params()).unwrap();

        let script = &candidate.get_coinbase().get_record().vout[1].script_pubkey;
        let expected = witness_commitment(&[tx.wtxid()]).unwrap();
        assert_eq!(crate::core::witness::extract_commitment(script), Some(expected));
    }

    #[test]
    fn test_negative_total_fee_is_rejected() {
        let tx = legacy_record(1_000, 2_000);
        let result = BlockCandidate::assemble(vec![tx.to_candidate("neg.json").unwrap()], &params());
        assert!(matches!(result, Err(MinerError::Template(_))));
    }

    #[test]
    fn test_mine_and_render() {
        let tx = legacy_record(100_000, 99_000);
        let block = BlockCandidate::assemble(vec![tx.to_candidate("tx.json").unwrap()], &params())
            .unwrap()
            .mine(&EASIEST, 1)
            .unwrap();

        assert_eq!(block.get_header().nonce, 0);
        let rendered = block.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 160);
        assert_eq!(lines[1], encode_hex(&block.get_coinbase().segwit_bytes()));
        assert_eq!(lines[2], to_display_hex(&block.get_coinbase().get_txid()));
        assert_eq!(lines[3], to_display_hex(&tx.txid()));
        assert_eq!(block.get_hash(), block.get_header().hash());
    }
}
