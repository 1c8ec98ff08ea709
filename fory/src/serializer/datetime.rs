//! Temporal codecs: DATE as varint days since the Unix epoch, TIMESTAMP as
//! raw little-endian microseconds, DURATION as seconds plus subsecond
//! nanoseconds.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};
use crate::fory::Fory;
use crate::resolver::context::{ReadContext, WriteContext};
use crate::serializer::{read_type_id, write_type_id, ForyDefault, Serializer};
use crate::types;

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

impl ForyDefault for NaiveDate {
    fn fory_default() -> Self {
        epoch_date()
    }
}

impl Serializer for NaiveDate {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::DATE
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        let days = self.signed_duration_since(epoch_date()).num_days();
        context.writer.var_int64(days);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::DATE);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let days = context.reader.var_int64();
        context.reader.check()?;
        epoch_date()
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| Error::deserialization(format!("date offset {days} days out of range")))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::DATE)
    }
}

impl ForyDefault for NaiveDateTime {
    fn fory_default() -> Self {
        DateTime::from_timestamp(0, 0).unwrap().naive_utc()
    }
}

impl Serializer for NaiveDateTime {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::TIMESTAMP
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        context.writer.i64(self.and_utc().timestamp_micros());
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::TIMESTAMP);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let micros = context.reader.i64();
        context.reader.check()?;
        let secs = micros.div_euclid(1_000_000);
        let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
        DateTime::from_timestamp(secs, nanos)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::deserialization(format!("timestamp {micros}us out of range")))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::TIMESTAMP)
    }
}

impl ForyDefault for Duration {
    fn fory_default() -> Self {
        Duration::zero()
    }
}

impl Serializer for Duration {
    fn fory_type_id(_fory: &Fory) -> u32 {
        types::DURATION
    }

    fn fory_write_data(&self, context: &mut WriteContext) {
        let secs = self.num_seconds();
        let nanos = (*self - Duration::seconds(secs)).num_nanoseconds().unwrap_or(0) as i32;
        context.writer.i64(secs);
        context.writer.i32(nanos);
    }

    fn fory_write_type_info(context: &mut WriteContext) {
        write_type_id(context, types::DURATION);
    }

    fn fory_read_data(context: &mut ReadContext) -> Result<Self> {
        let secs = context.reader.i64();
        let nanos = context.reader.i32();
        context.reader.check()?;
        Ok(Duration::seconds(secs) + Duration::nanoseconds(nanos as i64))
    }

    fn fory_read_type_info(context: &mut ReadContext) -> Result<()> {
        read_type_id(context, types::DURATION)
    }

    fn fory_reserved_space() -> usize {
        12
    }
}
