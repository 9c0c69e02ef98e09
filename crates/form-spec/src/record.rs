use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::FormError;
use crate::schema::{FormBindable, FormSchema};
use crate::value::FieldValue;

/// Host object whose fields live in a map described by a runtime schema.
///
/// Keys the schema does not declare are carried through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: FormSchema,
    values: BTreeMap<String, FieldValue>,
    undeclared: Map<String, Value>,
    updates: usize,
}

impl Record {
    pub fn new(schema: FormSchema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            undeclared: Map::new(),
            updates: 0,
        }
    }

    /// Loads declared fields from a JSON object and keeps every other key aside.
    pub fn from_json(schema: FormSchema, json: &Value) -> Result<Self, FormError> {
        let mut object = json.as_object().cloned().unwrap_or_default();
        let mut record = Self::new(schema);
        for declaration in &record.schema.fields {
            let Some(raw) = object.remove(&declaration.name) else {
                continue;
            };
            if let Some(value) = FieldValue::from_json(&declaration.name, declaration.declared_type, &raw)? {
                record.values.insert(declaration.name.clone(), value);
            }
        }
        record.undeclared = object;
        Ok(record)
    }

    /// The loaded object with declared fields overlaid; absent ones become `null`.
    pub fn to_json(&self) -> Value {
        let mut map = self.undeclared.clone();
        for declaration in &self.schema.fields {
            let value = self
                .values
                .get(&declaration.name)
                .map(FieldValue::to_json)
                .unwrap_or(Value::Null);
            map.insert(declaration.name.clone(), value);
        }
        Value::Object(map)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Number of completed form binds.
    pub fn update_count(&self) -> usize {
        self.updates
    }
}

impl FormBindable for Record {
    fn schema(&self) -> &FormSchema {
        &self.schema
    }

    fn read_field(&self, name: &str) -> Option<FieldValue> {
        self.values.get(name).cloned()
    }

    fn write_field(&mut self, name: &str, value: Option<FieldValue>) -> Result<(), FormError> {
        let declaration = self
            .schema
            .declaration(name)
            .ok_or_else(|| FormError::UnknownField {
                name: name.to_string(),
            })?;
        match value {
            Some(value) if value.kind() != declaration.declared_type => Err(FormError::TypeMismatch {
                field: name.to_string(),
                expected: declaration.declared_type,
                found: value.kind().to_string(),
            }),
            Some(value) => {
                self.values.insert(name.to_string(), value);
                Ok(())
            }
            None => {
                self.values.remove(name);
                Ok(())
            }
        }
    }

    fn on_update(&mut self) {
        self.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;
    use serde_json::json;

    fn schema() -> FormSchema {
        FormSchema::new("Item")
            .plain_field("name", ValueKind::String)
            .plain_field("count", ValueKind::Integer)
    }

    #[test]
    fn loads_and_saves_declared_fields() {
        let record = Record::from_json(schema(), &json!({ "name": "lamp" })).expect("load");
        assert_eq!(record.get("name"), Some(&FieldValue::Text("lamp".into())));
        assert_eq!(record.to_json(), json!({ "name": "lamp", "count": null }));
    }

    #[test]
    fn undeclared_keys_survive_a_save() {
        let mut record = Record::from_json(
            schema(),
            &json!({ "name": "lamp", "count": 1, "keep": "me", "nested": { "a": [1, 2] } }),
        )
        .expect("load");
        assert_eq!(record.get("keep"), None);
        record.write_field("count", Some(FieldValue::Integer(2))).expect("write");
        assert_eq!(
            record.to_json(),
            json!({ "name": "lamp", "count": 2, "keep": "me", "nested": { "a": [1, 2] } })
        );
    }

    #[test]
    fn rejects_unknown_and_mistyped_writes() {
        let mut record = Record::new(schema());
        assert!(matches!(
            record.write_field("color", Some(FieldValue::from("red"))),
            Err(FormError::UnknownField { .. })
        ));
        assert!(matches!(
            record.write_field("count", Some(FieldValue::from("three"))),
            Err(FormError::TypeMismatch { .. })
        ));
        record.write_field("count", Some(FieldValue::Integer(3))).expect("write");
        assert_eq!(record.get("count"), Some(&FieldValue::Integer(3)));
        record.write_field("count", None).expect("clear");
        assert_eq!(record.get("count"), None);
    }
}
