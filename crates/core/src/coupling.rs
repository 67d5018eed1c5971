//! Inter-process coupling
//!
//! Domains running in separate processes meet once per coupling step: each one
//! sends its burnt cells and its named scalar contributions to every peer, then
//! waits for the peers' messages before going on. The transport is abstracted by
//! [`MessageChannel`]; [`LocalBus`] connects endpoints living in one process.

use crate::error::CouplingError;
use rustc_hash::FxHashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Point-to-point, ordered, reliable byte transport between ranks
pub trait MessageChannel {
    /// Sends `payload` to `to`.
    ///
    /// # Errors
    /// Fails when the peer is gone or `to` is not a rank of the world.
    fn send(&mut self, to: usize, payload: &[u8]) -> Result<(), CouplingError>;

    /// Blocks until the next message from `from` arrives.
    ///
    /// # Errors
    /// Fails when the peer is gone or `from` is not a rank of the world.
    fn recv(&mut self, from: usize) -> Result<Vec<u8>, CouplingError>;
}

/// Coupling state owned by the simulation driver and threaded through every
/// exchange
#[derive(Debug, Clone, PartialEq)]
pub struct CouplingContext {
    pub rank: usize,
    pub world_size: usize,
    /// Completed exchanges
    pub iteration: u64,
    /// Named scalar layers; local contributions before an exchange, world totals after
    pub accumulated: FxHashMap<String, f64>,
}

impl CouplingContext {
    /// # Errors
    /// [`CouplingError::InvalidRank`] when `rank` is not below `world_size`.
    pub fn new(rank: usize, world_size: usize) -> Result<Self, CouplingError> {
        if rank >= world_size {
            return Err(CouplingError::InvalidRank { rank, world_size });
        }
        Ok(Self {
            rank,
            world_size,
            iteration: 0,
            accumulated: FxHashMap::default(),
        })
    }

    /// Context of a run without peers.
    pub fn single() -> Self {
        Self {
            rank: 0,
            world_size: 1,
            iteration: 0,
            accumulated: FxHashMap::default(),
        }
    }

    /// Adds `value` to the local contribution of `name`.
    pub fn accumulate(&mut self, name: &str, value: f64) {
        *self.accumulated.entry(name.to_string()).or_insert(0.0) += value;
    }

    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.accumulated.get(name).copied()
    }

    /// Every rank but this one, ascending.
    pub fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.world_size).filter(move |&r| r != self.rank)
    }

    /// Scalars as `count, (name length, name bytes, value)*`, sorted by name.
    pub(crate) fn encode_scalars(&self) -> Vec<u8> {
        let mut names: Vec<&String> = self.accumulated.keys().collect();
        names.sort();
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(names.len() as u64).to_le_bytes());
        for name in names {
            buffer.extend_from_slice(&(name.len() as u64).to_le_bytes());
            buffer.extend_from_slice(name.as_bytes());
            let value = self.accumulated.get(name).copied().unwrap_or(0.0);
            buffer.extend_from_slice(&value.to_le_bytes());
        }
        buffer
    }

    pub(crate) fn decode_scalars(buffer: &[u8]) -> Result<Vec<(String, f64)>, CouplingError> {
        let mut reader = ByteReader::new(buffer);
        let count = reader.u64()?;
        let mut out = Vec::new();
        for _ in 0..count {
            let len = reader.u64()? as usize;
            let name = std::str::from_utf8(reader.bytes(len)?)
                .map_err(|_| CouplingError::InvalidScalarName)?
                .to_string();
            out.push((name, reader.f64()?));
        }
        Ok(out)
    }
}

/// Little-endian cursor over a received payload
pub(crate) struct ByteReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    pub(crate) fn bytes(&mut self, len: usize) -> Result<&'a [u8], CouplingError> {
        let end = self.offset + len;
        if end > self.buffer.len() {
            return Err(CouplingError::Truncated {
                expected: end,
                found: self.buffer.len(),
            });
        }
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], CouplingError> {
        let mut out = [0_u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u64(&mut self) -> Result<u64, CouplingError> {
        self.array::<8>().map(u64::from_le_bytes)
    }

    pub(crate) fn i32(&mut self) -> Result<i32, CouplingError> {
        self.array::<4>().map(i32::from_le_bytes)
    }

    pub(crate) fn f64(&mut self) -> Result<f64, CouplingError> {
        self.array::<8>().map(f64::from_le_bytes)
    }
}

/// In-process message bus
#[derive(Debug)]
pub struct LocalBus;

impl LocalBus {
    /// Fully connected endpoints for ranks `0..world_size`, one per rank.
    pub fn mesh(world_size: usize) -> Vec<LocalEndpoint> {
        let mut senders: Vec<Vec<Option<Sender<Vec<u8>>>>> =
            (0..world_size).map(|_| vec![None; world_size]).collect();
        let mut receivers: Vec<Vec<Option<Receiver<Vec<u8>>>>> = (0..world_size)
            .map(|_| (0..world_size).map(|_| None).collect())
            .collect();
        for from in 0..world_size {
            for to in 0..world_size {
                if from == to {
                    continue;
                }
                let (tx, rx) = channel();
                senders[from][to] = Some(tx);
                receivers[to][from] = Some(rx);
            }
        }
        senders
            .into_iter()
            .zip(receivers)
            .enumerate()
            .map(|(rank, (senders, receivers))| LocalEndpoint {
                rank,
                senders,
                receivers,
            })
            .collect()
    }
}

/// One rank's end of a [`LocalBus`]
#[derive(Debug)]
pub struct LocalEndpoint {
    rank: usize,
    senders: Vec<Option<Sender<Vec<u8>>>>,
    receivers: Vec<Option<Receiver<Vec<u8>>>>,
}

impl LocalEndpoint {
    pub fn rank(&self) -> usize {
        self.rank
    }

    fn invalid(&self, rank: usize) -> CouplingError {
        CouplingError::InvalidRank {
            rank,
            world_size: self.senders.len(),
        }
    }
}

impl MessageChannel for LocalEndpoint {
    fn send(&mut self, to: usize, payload: &[u8]) -> Result<(), CouplingError> {
        let sender = self
            .senders
            .get(to)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.invalid(to))?;
        sender
            .send(payload.to_vec())
            .map_err(|_| CouplingError::Channel(format!("rank {to} hung up")))
    }

    fn recv(&mut self, from: usize) -> Result<Vec<u8>, CouplingError> {
        let receiver = self
            .receivers
            .get(from)
            .and_then(Option::as_ref)
            .ok_or_else(|| self.invalid(from))?;
        receiver
            .recv()
            .map_err(|_| CouplingError::Channel(format!("rank {from} hung up")))
    }
}
