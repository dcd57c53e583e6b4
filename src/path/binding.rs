//! Path binding state machine
//!
//! A bound path is in one of three shapes, each owning a fixed set of pipe
//! slots:
//!
//! ```text
//!   Decoder          encoder pipe:  pull[decoder]
//!   Encoder          encoder pipe:  push = encoder
//!   DecoderViaRtsp   rtsp-in pipe:  push = rtsp ingest, pull[decoder]
//! ```
//!
//! An unbound path has no entry at all. [`Binding::teardown`] releases
//! exactly the slots [`Binding::establish`] took, so the teardown of a path
//! depends only on how it was bound, not on the params of the next request.

use super::params::Params;
use super::PathId;
use crate::error::{Error, Result};
use crate::pipe::{Fabric, PipeKind};
use crate::worker::{WorkerId, WorkerRef};

/// How a path is currently bound
#[derive(Debug, Clone)]
pub enum Binding {
    /// Decoder pulling from the encoder pipe
    Decoder(WorkerRef),
    /// Encoder pushing into the encoder pipe
    Encoder(WorkerRef),
    /// Decoder pulling from the RTSP ingestion pipe
    DecoderViaRtsp { decoder: WorkerRef, rtsp: WorkerRef },
}

/// Name-only view of a path's binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingState {
    Unbound,
    BoundDecoder(String),
    BoundEncoder(String),
    BoundDecoderViaRtsp { decoder: String, rtsp: String },
}

impl Binding {
    /// Decide the binding shape for `worker` under `params`
    ///
    /// `rtsp` is only consulted for a decoder with RTSP input requested.
    pub fn plan<F>(worker: &WorkerRef, params: &Params, rtsp: F) -> Result<Self>
    where
        F: FnOnce() -> Result<WorkerRef>,
    {
        if worker.is_decoder() {
            if params.wants_rtsp_in() {
                Ok(Binding::DecoderViaRtsp {
                    decoder: worker.clone(),
                    rtsp: rtsp()?,
                })
            } else {
                Ok(Binding::Decoder(worker.clone()))
            }
        } else if worker.is_encoder() {
            Ok(Binding::Encoder(worker.clone()))
        } else {
            Err(Error::BadInput(worker.name().to_owned()))
        }
    }

    /// The worker the path was bound to
    pub fn worker(&self) -> &WorkerRef {
        match self {
            Binding::Decoder(w) | Binding::Encoder(w) => w,
            Binding::DecoderViaRtsp { decoder, .. } => decoder,
        }
    }

    /// Identity of the bound worker
    pub fn worker_id(&self) -> WorkerId {
        self.worker().id()
    }

    /// Whether the binding occupies `worker`, including the ingest worker
    pub fn holds(&self, worker: WorkerId) -> bool {
        match self {
            Binding::Decoder(w) | Binding::Encoder(w) => w.id() == worker,
            Binding::DecoderViaRtsp { decoder, rtsp } => {
                decoder.id() == worker || rtsp.id() == worker
            }
        }
    }

    /// Name-only view
    pub fn state(&self) -> BindingState {
        match self {
            Binding::Decoder(w) => BindingState::BoundDecoder(w.name().to_owned()),
            Binding::Encoder(w) => BindingState::BoundEncoder(w.name().to_owned()),
            Binding::DecoderViaRtsp { decoder, rtsp } => BindingState::BoundDecoderViaRtsp {
                decoder: decoder.name().to_owned(),
                rtsp: rtsp.name().to_owned(),
            },
        }
    }

    /// Take the pipe slots this binding needs
    ///
    /// For RTSP input the ingest worker is pushed before the decoder pulls.
    pub fn establish(&self, id: PathId, fabric: &mut Fabric) -> Result<()> {
        match self {
            Binding::Decoder(decoder) => fabric.node_mut(PipeKind::Encoder).alloc_pull(id, decoder),
            Binding::Encoder(encoder) => fabric.node_mut(PipeKind::Encoder).alloc_push(id, encoder),
            Binding::DecoderViaRtsp { decoder, rtsp } => {
                let node = fabric.node_mut(PipeKind::RtspIn);
                node.alloc_push(id, rtsp)?;
                node.alloc_pull(id, decoder)
            }
        }
    }

    /// Release the pipe slots this binding holds
    pub fn teardown(&self, id: PathId, fabric: &mut Fabric) -> Result<()> {
        match self {
            Binding::Decoder(decoder) => fabric.node_mut(PipeKind::Encoder).free_pull(id, decoder),
            Binding::Encoder(_) => fabric.node_mut(PipeKind::Encoder).free_push(id),
            Binding::DecoderViaRtsp { decoder, .. } => {
                let rtsp = fabric.node_mut(PipeKind::RtspIn);
                rtsp.free_push(id)?;
                rtsp.free_pull(id, decoder)?;
                fabric.node_mut(PipeKind::Encoder).free_pull(id, decoder)
            }
        }
    }
}

impl From<Option<&Binding>> for BindingState {
    fn from(binding: Option<&Binding>) -> Self {
        binding.map_or(BindingState::Unbound, Binding::state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::pipe::FabricConfig;
    use crate::worker::{SimWorker, Worker};

    fn dec() -> WorkerRef {
        Arc::new(SimWorker::decoder(1, "dec_1_0"))
    }

    fn enc() -> WorkerRef {
        Arc::new(SimWorker::encoder(2, "enc_2_0"))
    }

    fn rtsp() -> Result<WorkerRef> {
        Ok(Arc::new(SimWorker::encoder(254, "rtsp_254_0")))
    }

    #[test]
    fn test_plan_shapes() {
        let plain = Binding::plan(&dec(), &Params::new("dec_1_0", true), rtsp).unwrap();
        assert!(matches!(plain, Binding::Decoder(_)));

        let via = Binding::plan(&dec(), &Params::new("dec_1_0", true).rtsp_in(true), rtsp).unwrap();
        assert_eq!(
            via.state(),
            BindingState::BoundDecoderViaRtsp {
                decoder: "dec_1_0".into(),
                rtsp: "rtsp_254_0".into()
            }
        );

        // Encoders ignore the RTSP flag
        let encoder = Binding::plan(&enc(), &Params::new("enc_2_0", true).rtsp_in(true), || {
            Err(Error::WorkerNotFound("rtsp_254_0".into()))
        })
        .unwrap();
        assert_eq!(encoder.state(), BindingState::BoundEncoder("enc_2_0".into()));
    }

    #[test]
    fn test_plan_missing_rtsp_worker() {
        let result = Binding::plan(&dec(), &Params::new("dec_1_0", true).rtsp_in(true), || {
            Err(Error::WorkerNotFound("rtsp_254_0".into()))
        });
        assert!(matches!(result, Err(Error::WorkerNotFound(_))));
    }

    #[test]
    fn test_plan_rejects_incapable_worker() {
        #[derive(Debug)]
        struct Inert;

        impl Worker for Inert {
            fn id(&self) -> WorkerId {
                WorkerId(0)
            }
            fn name(&self) -> &str {
                "inert_0_0"
            }
            fn is_running(&self) -> bool {
                false
            }
            fn set_running(&self, _: bool) -> Result<()> {
                Ok(())
            }
            fn assign_decode_session(&self, _: crate::session::Session) -> Result<()> {
                Ok(())
            }
            fn assign_encode_session(&self, _: crate::session::Session) -> Result<()> {
                Ok(())
            }
        }

        let worker: WorkerRef = Arc::new(Inert);
        let result = Binding::plan(&worker, &Params::new("inert_0_0", true), rtsp);
        assert!(matches!(result, Err(Error::BadInput(_))));
    }

    #[test]
    fn test_establish_then_teardown_rtsp() {
        let mut fabric = Fabric::new(FabricConfig::default());
        let id = PathId::new(4);
        let binding = Binding::DecoderViaRtsp {
            decoder: dec(),
            rtsp: rtsp().unwrap(),
        };

        binding.establish(id, &mut fabric).unwrap();

        let node = fabric.node(PipeKind::RtspIn).unwrap();
        assert_eq!(node.inbound(id).unwrap().name(), "rtsp_254_0");
        assert_eq!(node.outbound_ids(id), vec![WorkerId(1)]);
        assert!(fabric.node(PipeKind::Encoder).unwrap().pipe(id).is_none());

        binding.teardown(id, &mut fabric).unwrap();

        let node = fabric.node(PipeKind::RtspIn).unwrap();
        assert!(node.pipe(id).unwrap().is_empty());
    }

    #[test]
    fn test_holds_ingest_worker() {
        let rtsp = rtsp().unwrap();
        let binding = Binding::DecoderViaRtsp {
            decoder: dec(),
            rtsp: rtsp.clone(),
        };
        assert!(binding.holds(WorkerId(1)));
        assert!(binding.holds(rtsp.id()));
        assert_eq!(binding.worker_id(), WorkerId(1));

        let plain = Binding::Decoder(dec());
        assert!(!plain.holds(rtsp.id()));
    }

    #[test]
    fn test_unbound_state() {
        assert_eq!(BindingState::from(None), BindingState::Unbound);
        let binding = Binding::Encoder(enc());
        assert_eq!(
            BindingState::from(Some(&binding)),
            BindingState::BoundEncoder("enc_2_0".into())
        );
    }
}
