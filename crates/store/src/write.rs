//! Batched point writes
//!
//! Outside a transaction the whole batch lands atomically through one
//! keyspace batch. Empty content is a delete. The flush option forces an
//! fsync before returning, trading the journal shortcut for durability.

use manifold_common::{encode_key, Error, Options, Places, Result, Strided, KEY_UNKNOWN};

use crate::database::Database;

pub(crate) fn validate_payloads(places: &Places<'_>, contents: &Strided<'_, &[u8]>) -> Result<()> {
    places.validate()?;
    contents.check(places.count)?;
    for index in 0..places.count {
        if places.get(index).key == KEY_UNKNOWN {
            return Err(Error::ArgsWrong("the reserved key cannot be written"));
        }
        if contents.get(index).len() >= u32::MAX as usize {
            return Err(Error::ArgsWrong("value is too long"));
        }
    }
    Ok(())
}

pub(crate) fn write_places(
    db: &Database,
    places: &Places<'_>,
    contents: Strided<'_, &[u8]>,
    options: Options,
) -> Result<()> {
    validate_payloads(places, &contents)?;
    if places.count == 0 {
        return Ok(());
    }

    let mut batch = db.keyspace().batch();
    for index in 0..places.count {
        let place = places.get(index);
        let partition = db.partition(place.collection)?;
        let key = encode_key(place.key);
        let bytes = *contents.get(index);
        if bytes.is_empty() {
            batch.remove(&partition, &key[..]);
        } else {
            batch.insert(&partition, &key[..], bytes);
        }
    }
    batch.commit()?;

    if options.flush() {
        db.keyspace().persist(fjall::PersistMode::SyncAll)?;
    }
    Ok(())
}
