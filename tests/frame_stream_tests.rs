use rand::Rng;
use wirecall::frame::{
    Frame, FrameCodec, FrameDecodeError, FrameHeader, FrameStreamDecoder, HeaderLayout,
    MessageStatus, MessageType, ProtocolError,
};
use wirecall::serializer::SerializerKind;

fn encoded(layout: HeaderLayout, request_id: u64, body: &[u8]) -> Vec<u8> {
    let header = FrameHeader::new(
        layout,
        SerializerKind::Native,
        MessageType::Response,
        MessageStatus::Ok,
        request_id,
    );
    FrameCodec::encode(&Frame::new(header, body.to_vec())).expect("encode failed")
}

fn split_randomly(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut rng = rand::rng();
    let mut chunks = vec![];
    let mut offset = 0;

    while offset < bytes.len() {
        let take = rng.random_range(1..=(bytes.len() - offset).min(23));
        chunks.push(bytes[offset..offset + take].to_vec());
        offset += take;
    }

    chunks
}

#[test]
fn random_chunking_yields_every_frame_once_in_order() {
    let mut stream = vec![];
    let mut expected = vec![];

    for request_id in 0..50u64 {
        let layout = if request_id % 3 == 0 {
            HeaderLayout::Legacy
        } else {
            HeaderLayout::Packed
        };
        let body: Vec<u8> = (0..(request_id as usize * 7)).map(|i| i as u8).collect();
        stream.extend(encoded(layout, request_id, &body));
        expected.push((request_id, body));
    }

    let mut decoder = FrameStreamDecoder::new();
    let mut incoming = vec![];

    for chunk in split_randomly(&stream) {
        for result in decoder.read_bytes(&chunk) {
            let frame = result.expect("decode failed");
            incoming.push((frame.header.request_id, frame.body));
        }
    }

    assert_eq!(incoming, expected);
    assert_eq!(decoder.buffered_len(), 0);
}

#[test]
fn single_byte_feeding_recovers_the_frame() {
    let bytes = encoded(HeaderLayout::Packed, 11, b"one byte at a time");
    let mut decoder = FrameStreamDecoder::new();
    let mut frames = vec![];

    for b in &bytes {
        frames.extend(decoder.read_bytes(std::slice::from_ref(b)));
    }

    assert_eq!(frames.len(), 1);
    let frame = frames.remove(0).unwrap();
    assert_eq!(frame.header.request_id, 11);
    assert_eq!(frame.body, b"one byte at a time");
}

#[test]
fn several_frames_in_one_chunk() {
    let mut chunk = encoded(HeaderLayout::Packed, 1, b"a");
    chunk.extend(encoded(HeaderLayout::Legacy, 2, b""));
    chunk.extend(encoded(HeaderLayout::Packed, 3, b"ccc"));

    let mut decoder = FrameStreamDecoder::new();
    let ids: Vec<u64> = decoder
        .read_bytes(&chunk)
        .map(|r| r.unwrap().header.request_id)
        .collect();

    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn bad_magic_poisons_the_stream() {
    let good = encoded(HeaderLayout::Packed, 1, b"ok");
    let mut bad = encoded(HeaderLayout::Packed, 2, b"bad");
    bad[0] = 0xFF;

    let mut stream = good.clone();
    stream.extend(&bad);
    stream.extend(&good);

    let mut decoder = FrameStreamDecoder::new();
    let results: Vec<_> = decoder.read_bytes(&stream).collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().header.request_id, 1);
    assert_eq!(
        results[1],
        Err(FrameDecodeError::new(None, ProtocolError::BadMagic(0xFF)))
    );
    assert!(decoder.is_poisoned());
    assert_eq!(decoder.buffered_len(), 0);

    let later: Vec<_> = decoder.read_bytes(&good).collect();
    assert_eq!(
        later,
        vec![Err(FrameDecodeError::new(None, ProtocolError::StreamPoisoned))]
    );
}

#[test]
fn bad_magic_is_detected_from_the_first_byte() {
    let mut decoder = FrameStreamDecoder::new();
    let results: Vec<_> = decoder.read_bytes(&[0x42]).collect();

    assert_eq!(
        results,
        vec![Err(FrameDecodeError::new(None, ProtocolError::BadMagic(0x42)))]
    );
}
