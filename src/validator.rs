//! The assertion engine: a recursive, pure walk of the compiled graph
//! against an instance, accreting a hierarchical error tree.
use crate::{
    error::{ValidateError, ValidationError, ValidationErrorKind},
    numeric,
    paths::{InstancePath, JsonPointer, PathChunk},
    resource,
    schema::{Additional, Dependency, Items, SchemaIndex, SchemaNode, SchemaStore},
};
use serde_json::{Map, Number, Value};
use std::cell::Cell;

/// Evaluate `instance` against the node at `index`. On failure the error
/// tree is wrapped in a root node naming the schema it was checked against.
pub(crate) fn validate(
    store: &SchemaStore,
    index: SchemaIndex,
    instance: &Value,
    max_depth: Option<usize>,
) -> Result<(), ValidateError> {
    let ctx = EvalCtx {
        store,
        max_depth: max_depth.unwrap_or(usize::MAX),
        depth_exceeded: Cell::new(false),
    };
    let result = ctx.validate_node(index, instance, &InstancePath::new(), None, 0);
    if ctx.depth_exceeded.get() {
        return Err(ValidateError::EvaluationDepthExceeded {
            limit: ctx.max_depth,
        });
    }
    match result {
        Ok(()) => Ok(()),
        Err(mut error) => {
            let root = store.get(index);
            if error.instance_location.is_empty()
                && matches!(error.kind, ValidationErrorKind::Group)
            {
                error.kind = ValidationErrorKind::Schema {
                    url: root.location.clone(),
                };
            } else {
                error = ValidationError::with_causes(
                    root.location.clone(),
                    JsonPointer::default(),
                    ValidationErrorKind::Schema {
                        url: root.location.clone(),
                    },
                    vec![error],
                );
            }
            Err(error.into())
        }
    }
}

struct EvalCtx<'a> {
    store: &'a SchemaStore,
    max_depth: usize,
    depth_exceeded: Cell<bool>,
}

impl<'a> EvalCtx<'a> {
    /// All failing assertions of one node folded into a single error: the
    /// lone failure itself, or a `Group` carrying them in evaluation order.
    fn validate_node(
        &self,
        index: SchemaIndex,
        instance: &Value,
        path: &InstancePath<'_>,
        rec: Option<SchemaIndex>,
        depth: usize,
    ) -> Result<(), ValidationError> {
        let mut errors = self.eval_node(index, instance, path, rec, depth);
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.pop().expect("one error")),
            _ => {
                let node = self.store.get(index);
                Err(ValidationError::with_causes(
                    node.location.clone(),
                    path.into(),
                    ValidationErrorKind::Group,
                    errors,
                ))
            }
        }
    }

    /// Silent check used where errors must not leak into the report.
    fn is_valid_node(&self, index: SchemaIndex, instance: &Value, rec: Option<SchemaIndex>, depth: usize) -> bool {
        self.eval_node(index, instance, &InstancePath::new(), rec, depth)
            .is_empty()
    }

    #[allow(clippy::too_many_lines)]
    fn eval_node(
        &self,
        index: SchemaIndex,
        instance: &Value,
        path: &InstancePath<'_>,
        rec: Option<SchemaIndex>,
        depth: usize,
    ) -> Vec<ValidationError> {
        if depth >= self.max_depth {
            self.depth_exceeded.set(true);
            return Vec::new();
        }
        let node = self.store.get(index);
        // The outermost schema with `$recursiveAnchor: true` pins the
        // dynamic target of `$recursiveRef`
        let rec = if node.recursive_anchor {
            rec.or(Some(index))
        } else {
            rec
        };
        match node.always {
            Some(true) => return Vec::new(),
            Some(false) => {
                return vec![self.err(node, "", path, ValidationErrorKind::FalseSchema)]
            }
            None => {}
        }
        let mut errors = Vec::new();

        if let Some(target) = node.ref_ {
            if let Some(error) = self.apply(node, "$ref", target, instance, path, rec, depth) {
                errors.push(error);
            }
        }
        if let Some(target) = node.recursive_ref {
            let effective = if self.store.get(target).recursive_anchor {
                rec.unwrap_or(target)
            } else {
                target
            };
            if let Some(error) =
                self.apply(node, "$recursiveRef", effective, instance, path, rec, depth)
            {
                errors.push(error);
            }
        }

        if !node.types.is_empty() && !node.types.matches(instance) {
            errors.push(self.err(
                node,
                "type",
                path,
                ValidationErrorKind::Type {
                    expected: node.types,
                    actual: instance.into(),
                },
            ));
        }
        if let Some(options) = &node.enum_ {
            if !options.iter().any(|option| json_equals(option, instance)) {
                errors.push(self.err(
                    node,
                    "enum",
                    path,
                    ValidationErrorKind::Enum {
                        options: options.clone(),
                    },
                ));
            }
        }
        if let Some(expected) = &node.constant {
            if !json_equals(expected, instance) {
                errors.push(self.err(
                    node,
                    "const",
                    path,
                    ValidationErrorKind::Constant {
                        expected: expected.clone(),
                    },
                ));
            }
        }
        if let Some((format, Some(check))) = &node.format {
            if !check.check(instance) {
                errors.push(self.err(
                    node,
                    "format",
                    path,
                    ValidationErrorKind::Format {
                        format: format.clone(),
                    },
                ));
            }
        }

        match instance {
            Value::Object(object) => {
                self.eval_object(node, object, instance, path, rec, depth, &mut errors);
            }
            Value::Array(items) => {
                self.eval_array(node, items, path, rec, depth, &mut errors);
            }
            Value::String(string) => self.eval_string(node, string, path, &mut errors),
            Value::Number(number) => self.eval_number(node, number, path, &mut errors),
            _ => {}
        }

        if let Some(target) = node.not {
            if self.is_valid_node(target, instance, rec, depth + 1) {
                errors.push(self.err(node, "not", path, ValidationErrorKind::Not));
            }
        }
        for (position, target) in node.all_of.iter().enumerate() {
            let keyword = format!("allOf/{position}");
            if let Some(error) = self.apply(node, &keyword, *target, instance, path, rec, depth) {
                errors.push(error);
            }
        }
        if !node.any_of.is_empty()
            && !node
                .any_of
                .iter()
                .any(|target| self.is_valid_node(*target, instance, rec, depth + 1))
        {
            errors.push(self.err(node, "anyOf", path, ValidationErrorKind::AnyOf));
        }
        if !node.one_of.is_empty() {
            let mut matched = Vec::with_capacity(1);
            for (position, target) in node.one_of.iter().enumerate() {
                if self.is_valid_node(*target, instance, rec, depth + 1) {
                    matched.push(position);
                    if matched.len() == 2 {
                        break;
                    }
                }
            }
            match matched.as_slice() {
                [] => {
                    errors.push(self.err(node, "oneOf", path, ValidationErrorKind::OneOfNotValid));
                }
                [_] => {}
                [first, second, ..] => errors.push(self.err(
                    node,
                    "oneOf",
                    path,
                    ValidationErrorKind::OneOfMultipleValid {
                        first: *first,
                        second: *second,
                    },
                )),
            }
        }
        if let Some(condition) = node.if_ {
            // `if` is evaluated silently; its errors are discarded
            if self.is_valid_node(condition, instance, rec, depth + 1) {
                if let Some(target) = node.then_ {
                    if let Some(error) =
                        self.apply(node, "then", target, instance, path, rec, depth)
                    {
                        errors.push(error);
                    }
                }
            } else if let Some(target) = node.else_ {
                if let Some(error) = self.apply(node, "else", target, instance, path, rec, depth) {
                    errors.push(error);
                }
            }
        }
        errors
    }

    #[allow(clippy::too_many_arguments, clippy::too_many_lines)]
    fn eval_object(
        &self,
        node: &SchemaNode,
        object: &Map<String, Value>,
        instance: &Value,
        path: &InstancePath<'_>,
        rec: Option<SchemaIndex>,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(limit) = node.min_properties {
            if (object.len() as u64) < limit {
                errors.push(self.err(
                    node,
                    "minProperties",
                    path,
                    ValidationErrorKind::MinProperties { limit },
                ));
            }
        }
        if let Some(limit) = node.max_properties {
            if (object.len() as u64) > limit {
                errors.push(self.err(
                    node,
                    "maxProperties",
                    path,
                    ValidationErrorKind::MaxProperties { limit },
                ));
            }
        }
        // One error per missing name, in declared order
        for property in &node.required {
            if !object.contains_key(property) {
                errors.push(self.err(
                    node,
                    "required",
                    path,
                    ValidationErrorKind::Required {
                        property: property.clone(),
                    },
                ));
            }
        }
        for (name, dependency) in &node.dependencies {
            if !object.contains_key(name) {
                continue;
            }
            let keyword = format!("dependencies/{}", resource::escape(name));
            match dependency {
                Dependency::Required(required) => {
                    for property in required {
                        if !object.contains_key(property) {
                            errors.push(self.err(
                                node,
                                &keyword,
                                path,
                                ValidationErrorKind::Required {
                                    property: property.clone(),
                                },
                            ));
                        }
                    }
                }
                Dependency::Schema(target) => {
                    if let Some(error) =
                        self.apply(node, &keyword, *target, instance, path, rec, depth)
                    {
                        errors.push(error);
                    }
                }
            }
        }
        for (name, required) in &node.dependent_required {
            if !object.contains_key(name) {
                continue;
            }
            let keyword = format!("dependentRequired/{}", resource::escape(name));
            for property in required {
                if !object.contains_key(property) {
                    errors.push(self.err(
                        node,
                        &keyword,
                        path,
                        ValidationErrorKind::Required {
                            property: property.clone(),
                        },
                    ));
                }
            }
        }
        for (name, target) in &node.dependent_schemas {
            if !object.contains_key(name) {
                continue;
            }
            let keyword = format!("dependentSchemas/{}", resource::escape(name));
            if let Some(error) = self.apply(node, &keyword, *target, instance, path, rec, depth) {
                errors.push(error);
            }
        }
        for (name, target) in &node.properties {
            if let Some(value) = object.get(name) {
                let keyword = format!("properties/{}", resource::escape(name));
                let chunk = PathChunk::from(name.as_str());
                let value_path = path.push(&chunk);
                if let Some(error) =
                    self.apply(node, &keyword, *target, value, &value_path, rec, depth)
                {
                    errors.push(error);
                }
            }
        }
        for (source, regex, target) in &node.pattern_properties {
            let keyword = format!("patternProperties/{}", resource::escape(source));
            for (name, value) in object {
                match regex.is_match(name) {
                    Ok(true) => {
                        let chunk = PathChunk::from(name.as_str());
                        let value_path = path.push(&chunk);
                        if let Some(error) =
                            self.apply(node, &keyword, *target, value, &value_path, rec, depth)
                        {
                            errors.push(error);
                        }
                    }
                    Ok(false) => {}
                    Err(_) => errors.push(self.err(
                        node,
                        &keyword,
                        path,
                        ValidationErrorKind::BacktrackLimitExceeded {
                            pattern: source.clone(),
                        },
                    )),
                }
            }
        }
        match &node.additional_properties {
            Additional::Absent | Additional::Bool(true) => {}
            Additional::Bool(false) => {
                let unexpected: Vec<String> = object
                    .keys()
                    .filter(|name| !self.is_matched_property(node, name))
                    .cloned()
                    .collect();
                if !unexpected.is_empty() {
                    errors.push(self.err(
                        node,
                        "additionalProperties",
                        path,
                        ValidationErrorKind::AdditionalProperties { unexpected },
                    ));
                }
            }
            Additional::Schema(target) => {
                for (name, value) in object {
                    if self.is_matched_property(node, name) {
                        continue;
                    }
                    let chunk = PathChunk::from(name.as_str());
                    let value_path = path.push(&chunk);
                    if let Some(error) = self.apply(
                        node,
                        "additionalProperties",
                        *target,
                        value,
                        &value_path,
                        rec,
                        depth,
                    ) {
                        errors.push(error);
                    }
                }
            }
        }
        if let Some(target) = node.property_names {
            for name in object.keys() {
                let value = Value::String(name.clone());
                let chunk = PathChunk::from(name.as_str());
                let value_path = path.push(&chunk);
                if let Err(error) =
                    self.validate_node(target, &value, &value_path, rec, depth + 1)
                {
                    errors.push(ValidationError::with_causes(
                        self.kw(node, "propertyNames"),
                        (&value_path).into(),
                        ValidationErrorKind::PropertyNames {
                            property: name.clone(),
                        },
                        vec![error],
                    ));
                }
            }
        }
    }

    /// Whether `properties` or any `patternProperties` regex claims the
    /// name, making `additionalProperties` inapplicable to it.
    fn is_matched_property(&self, node: &SchemaNode, name: &str) -> bool {
        node.properties.iter().any(|(known, _)| known == name)
            || node
                .pattern_properties
                .iter()
                .any(|(_, regex, _)| matches!(regex.is_match(name), Ok(true)))
    }

    #[allow(clippy::too_many_arguments)]
    fn eval_array(
        &self,
        node: &SchemaNode,
        items: &[Value],
        path: &InstancePath<'_>,
        rec: Option<SchemaIndex>,
        depth: usize,
        errors: &mut Vec<ValidationError>,
    ) {
        if let Some(limit) = node.min_items {
            if (items.len() as u64) < limit {
                errors.push(self.err(node, "minItems", path, ValidationErrorKind::MinItems { limit }));
            }
        }
        if let Some(limit) = node.max_items {
            if (items.len() as u64) > limit {
                errors.push(self.err(node, "maxItems", path, ValidationErrorKind::MaxItems { limit }));
            }
        }
        if node.unique_items {
            'outer: for (second, right) in items.iter().enumerate().skip(1) {
                for (first, left) in items[..second].iter().enumerate() {
                    if json_equals(left, right) {
                        errors.push(self.err(
                            node,
                            "uniqueItems",
                            path,
                            ValidationErrorKind::UniqueItems { first, second },
                        ));
                        break 'outer;
                    }
                }
            }
        }
        match &node.items {
            Items::Absent => {}
            Items::Single(target) => {
                for (position, item) in items.iter().enumerate() {
                    let chunk = PathChunk::from(position);
                    let item_path = path.push(&chunk);
                    if let Some(error) =
                        self.apply(node, "items", *target, item, &item_path, rec, depth)
                    {
                        errors.push(error);
                    }
                }
            }
            Items::List(list) => {
                for (position, item) in items.iter().enumerate().take(list.len()) {
                    let keyword = format!("items/{position}");
                    let chunk = PathChunk::from(position);
                    let item_path = path.push(&chunk);
                    if let Some(error) =
                        self.apply(node, &keyword, list[position], item, &item_path, rec, depth)
                    {
                        errors.push(error);
                    }
                }
                // Indexes beyond the list are governed by `additionalItems`
                if items.len() > list.len() {
                    match &node.additional_items {
                        Additional::Absent | Additional::Bool(true) => {}
                        Additional::Bool(false) => errors.push(self.err(
                            node,
                            "additionalItems",
                            path,
                            ValidationErrorKind::AdditionalItems { limit: list.len() },
                        )),
                        Additional::Schema(target) => {
                            for (position, item) in items.iter().enumerate().skip(list.len()) {
                                let chunk = PathChunk::from(position);
                                let item_path = path.push(&chunk);
                                if let Some(error) = self.apply(
                                    node,
                                    "additionalItems",
                                    *target,
                                    item,
                                    &item_path,
                                    rec,
                                    depth,
                                ) {
                                    errors.push(error);
                                }
                            }
                        }
                    }
                }
            }
        }
        if let Some(target) = node.contains {
            let mut matched = 0_usize;
            let mut failures = Vec::new();
            for (position, item) in items.iter().enumerate() {
                let chunk = PathChunk::from(position);
                let item_path = path.push(&chunk);
                match self.validate_node(target, item, &item_path, rec, depth + 1) {
                    Ok(()) => matched += 1,
                    Err(error) => failures.push(ValidationError::with_causes(
                        self.kw(node, "contains"),
                        (&item_path).into(),
                        ValidationErrorKind::Subschema {
                            url: self.store.get(target).location.clone(),
                        },
                        vec![error],
                    )),
                }
            }
            // `minContains: 0` makes `contains` trivially satisfied
            let minimum = node.min_contains.unwrap_or(1);
            if (matched as u64) < minimum {
                let kind = if node.min_contains.is_some() {
                    ValidationErrorKind::MinContains {
                        matched,
                        limit: minimum,
                    }
                } else {
                    ValidationErrorKind::Contains
                };
                errors.push(ValidationError::with_causes(
                    self.kw(node, "contains"),
                    path.into(),
                    kind,
                    failures,
                ));
            }
            if let Some(limit) = node.max_contains {
                if (matched as u64) > limit {
                    errors.push(self.err(
                        node,
                        "maxContains",
                        path,
                        ValidationErrorKind::MaxContains { matched, limit },
                    ));
                }
            }
        }
    }

    fn eval_string(
        &self,
        node: &SchemaNode,
        string: &str,
        path: &InstancePath<'_>,
        errors: &mut Vec<ValidationError>,
    ) {
        let length = || string.chars().count() as u64;
        if let Some(limit) = node.min_length {
            if length() < limit {
                errors.push(self.err(node, "minLength", path, ValidationErrorKind::MinLength { limit }));
            }
        }
        if let Some(limit) = node.max_length {
            if length() > limit {
                errors.push(self.err(node, "maxLength", path, ValidationErrorKind::MaxLength { limit }));
            }
        }
        if let Some((source, regex)) = &node.pattern {
            match regex.is_match(string) {
                Ok(true) => {}
                Ok(false) => errors.push(self.err(
                    node,
                    "pattern",
                    path,
                    ValidationErrorKind::Pattern {
                        pattern: source.clone(),
                    },
                )),
                Err(_) => errors.push(self.err(
                    node,
                    "pattern",
                    path,
                    ValidationErrorKind::BacktrackLimitExceeded {
                        pattern: source.clone(),
                    },
                )),
            }
        }
        match (&node.content_encoding, &node.content_media_type) {
            (Some((encoding, check, convert)), media_type) => {
                if !check(string) {
                    errors.push(self.err(
                        node,
                        "contentEncoding",
                        path,
                        ValidationErrorKind::ContentEncoding {
                            encoding: encoding.clone(),
                        },
                    ));
                } else if let Some((media_type, media_check)) = media_type {
                    // Decode first, then check the payload
                    let decoded = convert(string);
                    if !decoded.as_deref().is_some_and(media_check) {
                        errors.push(self.err(
                            node,
                            "contentMediaType",
                            path,
                            ValidationErrorKind::ContentMediaType {
                                media_type: media_type.clone(),
                            },
                        ));
                    }
                }
            }
            (None, Some((media_type, check))) => {
                if !check(string) {
                    errors.push(self.err(
                        node,
                        "contentMediaType",
                        path,
                        ValidationErrorKind::ContentMediaType {
                            media_type: media_type.clone(),
                        },
                    ));
                }
            }
            (None, None) => {}
        }
    }

    fn eval_number(
        &self,
        node: &SchemaNode,
        number: &Number,
        path: &InstancePath<'_>,
        errors: &mut Vec<ValidationError>,
    ) {
        use std::cmp::Ordering;

        if let Some(limit) = &node.minimum {
            if numeric::compare(number, limit) == Ordering::Less {
                errors.push(self.err(
                    node,
                    "minimum",
                    path,
                    ValidationErrorKind::Minimum {
                        limit: limit.clone(),
                    },
                ));
            }
        }
        if let Some(limit) = &node.maximum {
            if numeric::compare(number, limit) == Ordering::Greater {
                errors.push(self.err(
                    node,
                    "maximum",
                    path,
                    ValidationErrorKind::Maximum {
                        limit: limit.clone(),
                    },
                ));
            }
        }
        if let Some(limit) = &node.exclusive_minimum {
            if numeric::compare(number, limit) != Ordering::Greater {
                errors.push(self.err(
                    node,
                    "exclusiveMinimum",
                    path,
                    ValidationErrorKind::ExclusiveMinimum {
                        limit: limit.clone(),
                    },
                ));
            }
        }
        if let Some(limit) = &node.exclusive_maximum {
            if numeric::compare(number, limit) != Ordering::Less {
                errors.push(self.err(
                    node,
                    "exclusiveMaximum",
                    path,
                    ValidationErrorKind::ExclusiveMaximum {
                        limit: limit.clone(),
                    },
                ));
            }
        }
        if let Some(multiple_of) = &node.multiple_of {
            if !numeric::is_multiple_of(number, multiple_of) {
                errors.push(self.err(
                    node,
                    "multipleOf",
                    path,
                    ValidationErrorKind::MultipleOf {
                        multiple_of: multiple_of.clone(),
                    },
                ));
            }
        }
    }

    /// Apply a subschema; a failure is wrapped into an error at the
    /// applying keyword, carrying the subschema's canonical URL.
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        node: &SchemaNode,
        keyword: &str,
        target: SchemaIndex,
        instance: &Value,
        path: &InstancePath<'_>,
        rec: Option<SchemaIndex>,
        depth: usize,
    ) -> Option<ValidationError> {
        match self.validate_node(target, instance, path, rec, depth + 1) {
            Ok(()) => None,
            Err(error) => {
                let target_node = self.store.get(target);
                // Lift a Group at the subschema itself to avoid a
                // double-nested level in the report
                let causes = if matches!(error.kind, ValidationErrorKind::Group)
                    && error.keyword_location == target_node.location
                {
                    error.causes
                } else {
                    vec![error]
                };
                Some(ValidationError::with_causes(
                    self.kw(node, keyword),
                    path.into(),
                    ValidationErrorKind::Subschema {
                        url: target_node.location.clone(),
                    },
                    causes,
                ))
            }
        }
    }

    fn kw(&self, node: &SchemaNode, keyword: &str) -> String {
        if keyword.is_empty() {
            node.location.clone()
        } else {
            format!("{}/{keyword}", node.location)
        }
    }

    fn err(
        &self,
        node: &SchemaNode,
        keyword: &str,
        path: &InstancePath<'_>,
        kind: ValidationErrorKind,
    ) -> ValidationError {
        ValidationError::new(self.kw(node, keyword), path.into(), kind)
    }
}

/// JSON equality: arrays elementwise in order, objects as unordered maps,
/// numbers by numeric value (`1 == 1.0`), strings by code points.
pub(crate) fn json_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => numeric::equals(left, right),
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right).all(|(left, right)| json_equals(left, right))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.iter().all(|(key, left)| {
                    right.get(key).is_some_and(|right| json_equals(left, right))
                })
        }
        _ => left == right,
    }
}
