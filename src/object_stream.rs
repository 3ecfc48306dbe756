use std::collections::BTreeMap;
use std::str::FromStr;

use log::warn;

use crate::parser::{self, ParserInput};
use crate::{Error, Object, ObjectId, Result, Stream};

/// An expanded `/Type /ObjStm` container.
///
/// Object streams hold non-stream objects packed into a single compressed
/// stream; the block before `/First` lists `id offset` pairs. All contained
/// objects have generation number zero.
#[derive(Debug)]
pub struct ObjectStream {
    pub objects: BTreeMap<ObjectId, Object>,
}

impl ObjectStream {
    pub fn new(stream: &mut Stream) -> Result<ObjectStream> {
        if stream.is_compressed() {
            stream.decompress()?;
        }

        if stream.content.is_empty() {
            return Ok(ObjectStream {
                objects: BTreeMap::new(),
            });
        }

        let first_offset: usize = stream
            .dict
            .get(b"First")
            .and_then(Object::as_i64)?
            .try_into()
            .map_err(|_| Error::ObjectStream("invalid First offset".to_string()))?;
        let index_block = stream
            .content
            .get(..first_offset)
            .ok_or(Error::InvalidOffset(first_offset))?;

        let numbers_str = std::str::from_utf8(index_block)?;
        let numbers: Vec<_> = numbers_str
            .split_whitespace()
            .map(|number| u32::from_str(number).ok())
            .collect();
        let len = numbers.len() / 2 * 2; // Ensure only pairs.

        let n = stream.dict.get(b"N").and_then(Object::as_i64)?;
        if numbers.len().try_into().ok() != n.checked_mul(2) {
            warn!("object stream dictionary announces a wrong number of objects");
        }

        let objects = numbers[..len]
            .chunks(2)
            .filter_map(|chunk: &[Option<u32>]| {
                let id = chunk[0]?;
                let offset = first_offset + chunk[1]? as usize;

                if offset >= stream.content.len() {
                    warn!("out-of-bounds offset in object stream");
                    return None;
                }
                let input = ParserInput::new_extra(&stream.content[offset..], "object stream");
                let object = parser::direct_object(input)?;

                Some(((id, 0), object))
            })
            .collect();

        Ok(ObjectStream { objects })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary;

    fn container(index: &str, bodies: &str, n: i64) -> Stream {
        let content = format!("{}{}", index, bodies).into_bytes();
        Stream::new(
            dictionary! {
                "Type" => "ObjStm",
                "N" => n,
                "First" => index.len() as i64,
            },
            content,
        )
    }

    #[test]
    fn expand_object_stream() {
        let mut stream = container("11 0 12 9 ", "<</A 1>> (password)", 2);
        let object_stream = ObjectStream::new(&mut stream).unwrap();

        assert_eq!(object_stream.objects.len(), 2);
        let dict = object_stream.objects[&(11, 0)].as_dict().unwrap();
        assert_eq!(dict.get(b"A").and_then(Object::as_i64).unwrap(), 1);
        assert_eq!(object_stream.objects[&(12, 0)].as_str().unwrap(), b"password");
    }

    #[test]
    fn expand_compressed_object_stream() {
        let body = format!("({})", "a".repeat(100));
        let mut stream = container("5 0 ", &body, 1);
        stream.compress().unwrap();
        assert!(stream.is_compressed());

        let object_stream = ObjectStream::new(&mut stream).unwrap();
        assert_eq!(object_stream.objects[&(5, 0)].as_str().unwrap(), "a".repeat(100).as_bytes());
    }

    #[test]
    fn skip_out_of_bounds_entries() {
        let mut stream = container("1 0 2 900 ", "null", 2);
        let object_stream = ObjectStream::new(&mut stream).unwrap();
        assert_eq!(object_stream.objects.len(), 1);
    }
}
