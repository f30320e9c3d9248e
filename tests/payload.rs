//! Standalone payloads nested and shipped inside messages.

use groupwire::{Message, Payload, PayloadRegistry, Registry};

#[test]
fn serialized_payload_rides_in_a_byte_message() -> Result<(), Box<dyn std::error::Error>> {
    let payload = Payload::composite([
        Payload::bytes(b"state:".to_vec()),
        Payload::composite([Payload::bytes(b"a=1;".to_vec()), Payload::bytes(b"b=2".to_vec())]),
    ]);
    let message = Message::bytes(payload.serialize()?);
    let decoded = Message::decode(message.encode()?, &Registry::new())?;

    let inner = decoded.array()?.ok_or("byte message without buffer")?;
    let restored = Payload::deserialize(inner.to_bytes(), &PayloadRegistry::new())?;
    assert_eq!(restored.size(), payload.size());

    let mut reader = restored.reader();
    let mut text = vec![0_u8; bytes::Buf::remaining(&reader)];
    bytes::Buf::copy_to_slice(&mut reader, &mut text);
    assert_eq!(text, b"state:a=1;b=2");
    Ok(())
}
