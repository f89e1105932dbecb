use bson_codec::{
    Bson,
    ObjectBuilder,
    ObjectDescriptor,
    ObjectKind,
    Property,
    Reader,
    Writer,
    doc,
    encode_to_vec,
    error::Result,
};
use serde_json::{Map, Value, json};

/// Decodes straight into `serde_json` values without building a `Document` first.
#[derive(Default)]
struct JsonBuilder;

struct Json(Value);

impl From<Bson> for Json {
    fn from(value: Bson) -> Self {
        Json(match value {
            Bson::Double(v) => json!(v),
            Bson::String(v) | Bson::Symbol(v) => Value::String(v),
            Bson::Boolean(v) => Value::Bool(v),
            Bson::Int32(v) => json!(v),
            Bson::Int64(v) => json!(v),
            Bson::ObjectId(id) => json!({ "$oid": id.to_hex() }),
            Bson::DateTime(dt) => json!({ "$date": dt.timestamp_millis() }),
            Bson::Null => Value::Null,
            other => Value::String(other.to_string()),
        })
    }
}

enum JsonObject {
    Map(Map<String, Value>),
    Array(Vec<Value>),
}

impl ObjectBuilder for JsonBuilder {
    type Object = JsonObject;
    type Value = Json;

    fn begin_object(&mut self) -> JsonObject {
        JsonObject::Map(Map::new())
    }

    fn end_object(&mut self, object: JsonObject) -> Result<Json> {
        Ok(match object {
            JsonObject::Map(map) => Json(Value::Object(map)),
            JsonObject::Array(values) => Json(Value::Array(values)),
        })
    }

    fn begin_array(&mut self) -> JsonObject {
        JsonObject::Array(Vec::new())
    }

    fn end_array(&mut self, array: JsonObject, _encoded_len: usize) -> Result<Json> {
        self.end_object(array)
    }

    fn end_property(&mut self, object: &mut JsonObject, name: &str, value: Json) -> Result<()> {
        match object {
            JsonObject::Map(map) => {
                map.insert(name.to_owned(), value.0);
            }
            JsonObject::Array(values) => values.push(value.0),
        }
        Ok(())
    }
}

#[test]
fn custom_builder_receives_the_structure() {
    let doc = doc! {
        "name": "widget",
        "count": 3,
        "tags": ["a", "b"],
        "dims": { "w": 1.5, "h": 2.0 },
        "missing": null,
    };
    let bytes = encode_to_vec(&doc).unwrap();

    let Json(value) = Reader::new(&bytes[..])
        .read_object(&mut JsonBuilder)
        .unwrap();

    assert_eq!(
        value,
        json!({
            "name": "widget",
            "count": 3,
            "tags": ["a", "b"],
            "dims": { "w": 1.5, "h": 2.0 },
            "missing": null,
        })
    );
}

struct Measurement {
    sensor: String,
    readings: Vec<f64>,
    note: Option<String>,
}

impl ObjectDescriptor for Measurement {
    fn properties(&self) -> Vec<Property<'_>> {
        let mut properties = vec![
            Property::owned("sensor", self.sensor.as_str()),
            Property::owned("readings", self.readings.clone()),
        ];
        // absent fields are skipped rather than written as null
        if let Some(note) = &self.note {
            properties.push(Property::owned("note", note.as_str()));
        }
        properties
    }
}

#[test]
fn custom_descriptor_controls_the_fields() {
    let measurement = Measurement {
        sensor: "t-1".to_owned(),
        readings: vec![20.5, 21.0],
        note: None,
    };
    assert_eq!(measurement.kind(), ObjectKind::Object);

    let mut bytes = Vec::new();
    Writer::new(&mut bytes).write_object(&measurement).unwrap();

    assert_eq!(
        bytes,
        encode_to_vec(&doc! { "sensor": "t-1", "readings": [20.5, 21.0] }).unwrap()
    );
}
