//! End-to-end fragmentation: split, encode, decode and reassemble.

mod common;

use std::{num::NonZeroUsize, sync::Arc};

use common::{StateSnapshot, TestResult, ViewHeader, registry};
use groupwire::{
    Address,
    Assembler,
    FragHeader,
    FragmentationConfig,
    Fragmenter,
    HeaderId,
    Message,
    Registry,
    fragment::DEFAULT_FRAG_HEADER_ID,
};
use proptest::prelude::*;
use rstest::rstest;

const VIEW: HeaderId = HeaderId::new(70);

fn transmit(fragments: &[Message], registry: &Registry) -> TestResult<Vec<Message>> {
    let mut received = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        let wire = fragment.encode()?;
        received.push(Message::decode(wire, registry)?);
    }
    Ok(received)
}

#[rstest]
fn state_transfer_survives_fragmentation(registry: Registry) -> TestResult {
    let snapshot = StateSnapshot {
        version: 4,
        entries: (0..=255).cycle().take(10_000).collect(),
    };
    let original = Message::object(Arc::new(snapshot.clone()))
        .with_dest(Address::new(1))
        .with_src(Address::new(2))
        .with_header(VIEW, Arc::new(ViewHeader { view_id: 12 }));

    let fragmenter = Fragmenter::new(FragmentationConfig::new(
        NonZeroUsize::new(1_500).ok_or("zero frag size")?,
        DEFAULT_FRAG_HEADER_ID,
    ));
    assert!(fragmenter.needs_fragmentation(&original)?);
    let expected = (1 + original.serialized_size()?).div_ceil(1_500);
    let batch = fragmenter.fragment_message(Arc::new(original))?;
    assert_eq!(batch.len(), expected);

    let received = transmit(batch.fragments(), &registry)?;
    let last = received.last().ok_or("no fragments")?;
    let header = last
        .header_as::<FragHeader>(DEFAULT_FRAG_HEADER_ID)
        .ok_or("missing fragment header")?;
    assert!(header.is_last());
    assert_eq!(header.num_frags() as usize, expected);

    let rebuilt = Assembler::new(&registry).assemble_fragments(&received)?;
    let Some(object) = (match rebuilt.body() {
        groupwire::Body::Object(body) => body.object_as::<StateSnapshot>(),
        _ => None,
    }) else {
        return Err("expected a state snapshot".into());
    };
    assert_eq!(object, &snapshot);
    assert_eq!(rebuilt.header_as::<ViewHeader>(VIEW).map(|h| h.view_id), Some(12));
    Ok(())
}

#[rstest]
fn frame_budget_bounds_every_fragment(registry: Registry) -> TestResult {
    let config = FragmentationConfig::for_frame_budget(512, DEFAULT_FRAG_HEADER_ID)
        .ok_or("budget below overhead")?;
    let original = Message::bytes(vec![0xaa; 5_000])
        .with_dest(Address::new(u128::MAX))
        .with_src(Address::new(u128::MAX - 1));
    let batch = Fragmenter::new(config).fragment_message(Arc::new(original))?;

    for fragment in batch.fragments() {
        let wire = fragment.encode()?;
        assert!(wire.len() <= config.encoded_fragment_ceiling());
        assert!(wire.len() <= 512);
    }
    let received = transmit(batch.fragments(), &registry)?;
    let rebuilt = Assembler::new(&registry).assemble_fragments(&received)?;
    assert_eq!(rebuilt.length()?, 5_000);
    Ok(())
}

#[rstest]
fn fragments_can_be_resent(registry: Registry) -> TestResult {
    let batch = Fragmenter::default()
        .fragment_message(Arc::new(Message::nio_direct(vec![5_u8; 64])))?;
    let first = transmit(batch.fragments(), &registry)?;
    let second = transmit(batch.fragments(), &registry)?;
    let encode_all = |messages: &[Message]| {
        messages.iter().map(Message::encode).collect::<Result<Vec<_>, _>>()
    };
    assert_eq!(encode_all(&first)?, encode_all(&second)?);
    Ok(())
}

proptest! {
    #[test]
    fn any_window_size_reassembles_a_composite(
        sizes in proptest::collection::vec(0usize..400, 1..6),
        frag_size in 16usize..256,
    ) {
        let registry = registry();
        let children = sizes.iter().map(|&len| Message::bytes(vec![len as u8; len]));
        let original = Message::composite(children);
        let expected = original.encode().expect("encode original");

        let fragmenter = Fragmenter::new(FragmentationConfig::new(
            NonZeroUsize::new(frag_size).expect("non-zero"),
            DEFAULT_FRAG_HEADER_ID,
        ));
        let batch = fragmenter.fragment_message(Arc::new(original)).expect("fragment");
        let received = transmit(batch.fragments(), &registry).expect("transmit");
        let rebuilt = Assembler::new(&registry)
            .assemble_fragments(&received)
            .expect("reassemble");
        prop_assert_eq!(rebuilt.encode().expect("encode rebuilt"), expected);
    }
}
