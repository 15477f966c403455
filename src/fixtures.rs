//! In-code test fixtures: a minimal little-endian TIFF/EXIF writer and
//! a JPEG wrapper around it.

const ASCII: u16 = 2;
const BYTE: u16 = 1;
const LONG: u16 = 4;
const RATIONAL: u16 = 5;
const GPS_IFD_POINTER: u16 = 0x8825;

#[derive(Clone)]
struct Entry {
    tag: u16,
    kind: u16,
    count: u32,
    data: Vec<u8>,
}

impl Entry {
    fn ascii(tag: u16, value: &str) -> Self {
        let mut data = value.as_bytes().to_vec();
        data.push(0);
        Self {
            tag,
            kind: ASCII,
            count: data.len() as u32,
            data,
        }
    }

    fn rationals(tag: u16, values: &[(u32, u32)]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for (num, den) in values {
            data.extend_from_slice(&num.to_le_bytes());
            data.extend_from_slice(&den.to_le_bytes());
        }
        Self {
            tag,
            kind: RATIONAL,
            count: values.len() as u32,
            data,
        }
    }
}

fn padded(len: usize) -> usize {
    len + len % 2
}

fn ifd_len(entries: &[Entry]) -> usize {
    let out_of_line: usize = entries
        .iter()
        .filter(|e| e.data.len() > 4)
        .map(|e| padded(e.data.len()))
        .sum();
    2 + 12 * entries.len() + 4 + out_of_line
}

fn write_ifd(buf: &mut Vec<u8>, entries: &[Entry]) {
    let offset = buf.len();
    let data_start = offset + 2 + 12 * entries.len() + 4;
    let mut data_area = Vec::new();

    buf.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    for entry in entries {
        buf.extend_from_slice(&entry.tag.to_le_bytes());
        buf.extend_from_slice(&entry.kind.to_le_bytes());
        buf.extend_from_slice(&entry.count.to_le_bytes());
        if entry.data.len() <= 4 {
            let mut inline = entry.data.clone();
            inline.resize(4, 0);
            buf.extend_from_slice(&inline);
        } else {
            let pos = (data_start + data_area.len()) as u32;
            buf.extend_from_slice(&pos.to_le_bytes());
            data_area.extend_from_slice(&entry.data);
            if data_area.len() % 2 == 1 {
                data_area.push(0);
            }
        }
    }
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&data_area);
}

/// Builds a TIFF payload with an IFD0 and an optional GPS IFD
#[derive(Default)]
pub(crate) struct TiffBuilder {
    ifd0: Vec<Entry>,
    gps: Vec<Entry>,
}

impl TiffBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ascii(mut self, tag: u16, value: &str) -> Self {
        self.ifd0.push(Entry::ascii(tag, value));
        self
    }

    pub(crate) fn gps_ascii(mut self, tag: u16, value: &str) -> Self {
        self.gps.push(Entry::ascii(tag, value));
        self
    }

    pub(crate) fn gps_rationals(mut self, tag: u16, values: &[(u32, u32)]) -> Self {
        self.gps.push(Entry::rationals(tag, values));
        self
    }

    pub(crate) fn gps_byte(mut self, tag: u16, value: u8) -> Self {
        self.gps.push(Entry {
            tag,
            kind: BYTE,
            count: 1,
            data: vec![value],
        });
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut ifd0 = self.ifd0;
        let mut gps = self.gps;
        let has_gps = !gps.is_empty();

        if has_gps {
            ifd0.push(Entry {
                tag: GPS_IFD_POINTER,
                kind: LONG,
                count: 1,
                data: vec![0; 4],
            });
        }
        ifd0.sort_by_key(|e| e.tag);
        gps.sort_by_key(|e| e.tag);

        let gps_offset = (8 + ifd_len(&ifd0)) as u32;
        if has_gps {
            for entry in ifd0.iter_mut().filter(|e| e.tag == GPS_IFD_POINTER) {
                entry.data = gps_offset.to_le_bytes().to_vec();
            }
        }

        let mut buf = Vec::new();
        buf.extend_from_slice(b"II");
        buf.extend_from_slice(&42u16.to_le_bytes());
        buf.extend_from_slice(&8u32.to_le_bytes());
        write_ifd(&mut buf, &ifd0);
        if has_gps {
            write_ifd(&mut buf, &gps);
        }
        buf
    }
}

/// Minimal JPEG: SOI, APP0 (JFIF), APP1 (EXIF), DQT, SOS with scan bytes, EOI
pub(crate) fn jpeg_with_app1(tiff: &[u8]) -> Vec<u8> {
    jpeg_with_segments(&[(0xE1, exif_payload(tiff))])
}

/// The same JPEG without any metadata segment
pub(crate) fn jpeg_without_metadata() -> Vec<u8> {
    jpeg_with_segments(&[])
}

/// JPEG with the given `(marker, contents)` segments after APP0
pub(crate) fn jpeg_with_segments(segments: &[(u8, Vec<u8>)]) -> Vec<u8> {
    let mut jpeg = vec![0xFF, 0xD8];
    jpeg.extend_from_slice(&app0());
    for (marker, contents) in segments {
        jpeg.extend_from_slice(&[0xFF, *marker]);
        jpeg.extend_from_slice(&((contents.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(contents);
    }
    jpeg.extend_from_slice(&image_tail());
    jpeg
}

pub(crate) fn exif_payload(tiff: &[u8]) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(tiff);
    payload
}

pub(crate) fn xmp_payload() -> Vec<u8> {
    let mut payload = b"http://ns.adobe.com/xap/1.0/\0".to_vec();
    payload.extend_from_slice(b"<x:xmpmeta><dc:creator>Jane</dc:creator></x:xmpmeta>");
    payload
}

pub(crate) fn icc_payload() -> Vec<u8> {
    let mut payload = b"ICC_PROFILE\0".to_vec();
    payload.extend_from_slice(&[1, 1]);
    payload.extend_from_slice(&[0x42; 16]);
    payload
}

/// PNG: IHDR, optional eXIf, the extra chunks, IDAT, IEND
pub(crate) fn png_with(tiff: Option<&[u8]>, extra: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&1u32.to_be_bytes());
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);
    push_png_chunk(&mut png, b"IHDR", &ihdr);
    if let Some(tiff) = tiff {
        push_png_chunk(&mut png, b"eXIf", tiff);
    }
    for (kind, contents) in extra {
        push_png_chunk(&mut png, kind, contents);
    }
    push_png_chunk(&mut png, b"IDAT", &[0x78, 0x9C, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    push_png_chunk(&mut png, b"IEND", &[]);
    png
}

fn push_png_chunk(png: &mut Vec<u8>, kind: &[u8; 4], contents: &[u8]) {
    png.extend_from_slice(&(contents.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(contents);
    let mut crc_input = kind.to_vec();
    crc_input.extend_from_slice(contents);
    png.extend_from_slice(&crc32(&crc_input).to_be_bytes());
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for byte in data {
        crc ^= u32::from(*byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
        }
    }
    !crc
}

/// Extended WebP: VP8X, VP8L, then the optional EXIF and XMP chunks
pub(crate) fn webp_with(tiff: Option<&[u8]>, xmp: bool) -> Vec<u8> {
    let mut flags = 0u8;
    if tiff.is_some() {
        flags |= 0x08;
    }
    if xmp {
        flags |= 0x04;
    }
    let mut vp8x = vec![flags, 0, 0, 0];
    vp8x.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut chunks = Vec::new();
    push_riff_chunk(&mut chunks, b"VP8X", &vp8x);
    push_riff_chunk(&mut chunks, b"VP8L", &[0x2F, 0x00, 0x00, 0x00, 0x00, 0x00]);
    if let Some(tiff) = tiff {
        push_riff_chunk(&mut chunks, b"EXIF", tiff);
    }
    if xmp {
        push_riff_chunk(&mut chunks, b"XMP ", b"<x:xmpmeta/>");
    }

    let mut webp = b"RIFF".to_vec();
    webp.extend_from_slice(&((chunks.len() + 4) as u32).to_le_bytes());
    webp.extend_from_slice(b"WEBP");
    webp.extend_from_slice(&chunks);
    webp
}

fn push_riff_chunk(out: &mut Vec<u8>, id: &[u8; 4], contents: &[u8]) {
    out.extend_from_slice(id);
    out.extend_from_slice(&(contents.len() as u32).to_le_bytes());
    out.extend_from_slice(contents);
    if contents.len() % 2 == 1 {
        out.push(0);
    }
}

fn app0() -> Vec<u8> {
    let mut segment = vec![0xFF, 0xE0, 0x00, 0x10];
    segment.extend_from_slice(b"JFIF\0");
    segment.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    segment
}

fn image_tail() -> Vec<u8> {
    let mut tail = vec![0xFF, 0xDB, 0x00, 0x04, 0x00, 0x01];
    tail.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    tail.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56, 0x78]);
    tail.extend_from_slice(&[0xFF, 0xD9]);
    tail
}
