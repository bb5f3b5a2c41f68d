use super::{HostError, methods, traits::FromParams};
use psrp_protocol::{ComplexObjectContent, Container, PsValue};

/// The items of a CLIXML list (`<Obj><LST>...`), the shape PSRP uses for
/// `Vec<FieldDescription>`/`Vec<ChoiceDescription>`/`Vec<Vec<BufferCell>>` parameters.
fn as_list(value: &PsValue) -> Option<&[PsValue]> {
    match value {
        PsValue::Object(obj) => match &obj.content {
            ComplexObjectContent::Container(Container::List(items)) => Some(items),
            _ => None,
        },
        PsValue::Primitive(_) => None,
    }
}

fn as_property_string(
    obj: &psrp_protocol::ComplexObject,
    name: &str,
) -> Result<String, HostError> {
    obj.extended_properties
        .get(name)
        .and_then(|prop| prop.value.as_string())
        .ok_or(HostError::InvalidParameters)
}

fn as_property_bool(obj: &psrp_protocol::ComplexObject, name: &str) -> Result<bool, HostError> {
    match obj.extended_properties.get(name).map(|prop| &prop.value) {
        Some(PsValue::Primitive(psrp_protocol::PsPrimitiveValue::Bool(b))) => Ok(*b),
        _ => Err(HostError::InvalidParameters),
    }
}

// Complex parameter type implementations
impl FromParams for (i32, i32, String) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 3 {
            return Err(HostError::InvalidParameters);
        }
        let fg = a[0].as_i32().ok_or(HostError::InvalidParameters)?;
        let bg = a[1].as_i32().ok_or(HostError::InvalidParameters)?;
        let value = a[2].as_string().ok_or(HostError::InvalidParameters)?;
        Ok((fg, bg, value))
    }
}

impl FromParams for (i64, methods::ProgressRecord) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 2 {
            return Err(HostError::InvalidParameters);
        }
        let source_id = a[0].as_i64().ok_or(HostError::InvalidParameters)?;
        let obj = a[1].as_object().ok_or(HostError::InvalidParameters)?;
        let record = psrp_protocol::ProgressRecord::try_from(obj.clone())
            .map_err(|_| HostError::InvalidParameters)?;

        Ok((
            source_id,
            methods::ProgressRecord {
                activity: record.activity,
                status_description: record.status_description.unwrap_or_default(),
                current_operation: record.current_operation.unwrap_or_default(),
                activity_id: record.activity_id,
                parent_activity_id: record.parent_activity_id.unwrap_or(-1),
                percent_complete: record.percent_complete,
                seconds_remaining: record.seconds_remaining.unwrap_or(0),
                record_type: record.progress_type.as_i32(),
            },
        ))
    }
}

fn field_description_from_object(obj: &psrp_protocol::ComplexObject) -> Result<methods::FieldDescription, HostError> {
    let name = as_property_string(obj, "name")?;
    let label = as_property_string(obj, "label")?;
    let help_message = as_property_string(obj, "helpMessage").unwrap_or_default();
    let is_mandatory = as_property_bool(obj, "isMandatory").unwrap_or(false);
    let parameter_type = as_property_string(obj, "parameterTypeName").unwrap_or_default();
    let default_value = obj.extended_properties.get("defaultValue").map(|prop| prop.value.clone());

    Ok(methods::FieldDescription {
        name,
        label,
        help_message,
        is_mandatory,
        parameter_type,
        default_value,
    })
}

fn choice_description_from_object(obj: &psrp_protocol::ComplexObject) -> Result<methods::ChoiceDescription, HostError> {
    let label = as_property_string(obj, "label")?;
    let help_message = as_property_string(obj, "helpMessage").unwrap_or_default();
    Ok(methods::ChoiceDescription { label, help_message })
}

impl FromParams for (String, String, Vec<methods::FieldDescription>) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 3 {
            return Err(HostError::InvalidParameters);
        }
        let caption = a[0].as_string().ok_or(HostError::InvalidParameters)?;
        let message = a[1].as_string().ok_or(HostError::InvalidParameters)?;
        let items = as_list(&a[2]).ok_or(HostError::InvalidParameters)?;
        let descriptions = items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or(HostError::InvalidParameters)
                    .and_then(field_description_from_object)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((caption, message, descriptions))
    }
}

impl FromParams for (String, String, String, String) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 4 {
            return Err(HostError::InvalidParameters);
        }
        let caption = a[0].as_string().ok_or(HostError::InvalidParameters)?;
        let message = a[1].as_string().ok_or(HostError::InvalidParameters)?;
        let user_name = a[2].as_string().ok_or(HostError::InvalidParameters)?;
        let target_name = a[3].as_string().ok_or(HostError::InvalidParameters)?;
        Ok((caption, message, user_name, target_name))
    }
}

impl FromParams for (String, String, String, String, i32, i32) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 6 {
            return Err(HostError::InvalidParameters);
        }
        let caption = a[0].as_string().ok_or(HostError::InvalidParameters)?;
        let message = a[1].as_string().ok_or(HostError::InvalidParameters)?;
        let user_name = a[2].as_string().ok_or(HostError::InvalidParameters)?;
        let target_name = a[3].as_string().ok_or(HostError::InvalidParameters)?;
        let allowed_types = a[4].as_i32().ok_or(HostError::InvalidParameters)?;
        let options = a[5].as_i32().ok_or(HostError::InvalidParameters)?;
        Ok((
            caption,
            message,
            user_name,
            target_name,
            allowed_types,
            options,
        ))
    }
}

impl FromParams for (String, String, Vec<methods::ChoiceDescription>, i32) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 4 {
            return Err(HostError::InvalidParameters);
        }
        let caption = a[0].as_string().ok_or(HostError::InvalidParameters)?;
        let message = a[1].as_string().ok_or(HostError::InvalidParameters)?;
        let items = as_list(&a[2]).ok_or(HostError::InvalidParameters)?;
        let choices = items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or(HostError::InvalidParameters)
                    .and_then(choice_description_from_object)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let default_choice = a[3].as_i32().ok_or(HostError::InvalidParameters)?;
        Ok((caption, message, choices, default_choice))
    }
}

impl FromParams for (String, String, Vec<methods::ChoiceDescription>, Vec<i32>) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 4 {
            return Err(HostError::InvalidParameters);
        }
        let caption = a[0].as_string().ok_or(HostError::InvalidParameters)?;
        let message = a[1].as_string().ok_or(HostError::InvalidParameters)?;
        let items = as_list(&a[2]).ok_or(HostError::InvalidParameters)?;
        let choices = items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or(HostError::InvalidParameters)
                    .and_then(choice_description_from_object)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let defaults = as_list(&a[3]).ok_or(HostError::InvalidParameters)?;
        let defaults = defaults
            .iter()
            .map(|item| item.as_i32().ok_or(HostError::InvalidParameters))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((caption, message, choices, defaults))
    }
}

impl FromParams for methods::Coordinates {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 1 {
            return Err(HostError::InvalidParameters);
        }

        match &a[0] {
            PsValue::Object(obj) => {
                let x = obj
                    .extended_properties
                    .get("x")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;

                let y = obj
                    .extended_properties
                    .get("y")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;

                Ok(methods::Coordinates { x, y })
            }
            _ => Err(HostError::InvalidParameters),
        }
    }
}

impl FromParams for (methods::Coordinates,) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        let coord = methods::Coordinates::from_params(a)?;
        Ok((coord,))
    }
}

impl FromParams for methods::Size {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 1 {
            return Err(HostError::InvalidParameters);
        }

        match &a[0] {
            PsValue::Object(obj) => {
                let width = obj
                    .extended_properties
                    .get("width")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;

                let height = obj
                    .extended_properties
                    .get("height")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;

                Ok(methods::Size { width, height })
            }
            _ => Err(HostError::InvalidParameters),
        }
    }
}

impl FromParams for (methods::Size,) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        let size = methods::Size::from_params(a)?;
        Ok((size,))
    }
}

impl FromParams for methods::Rectangle {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 1 {
            return Err(HostError::InvalidParameters);
        }
        
        match &a[0] {
            PsValue::Object(obj) => {
                let left = obj.extended_properties
                    .get("left")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                let top = obj.extended_properties
                    .get("top")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                let right = obj.extended_properties
                    .get("right")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                let bottom = obj.extended_properties
                    .get("bottom")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                Ok(methods::Rectangle { left, top, right, bottom })
            }
            _ => Err(HostError::InvalidParameters),
        }
    }
}

fn buffer_cell_rows_from_value(value: &PsValue) -> Result<Vec<Vec<methods::BufferCell>>, HostError> {
    let rows = as_list(value).ok_or(HostError::InvalidParameters)?;
    rows.iter()
        .map(|row| {
            let cells = as_list(row).ok_or(HostError::InvalidParameters)?;
            cells
                .iter()
                .map(|cell| methods::BufferCell::from_params(std::slice::from_ref(cell)))
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()
}

impl FromParams for (methods::Coordinates, Vec<Vec<methods::BufferCell>>) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 2 {
            return Err(HostError::InvalidParameters);
        }
        let origin = methods::Coordinates::from_params(&a[0..1])?;
        let contents = buffer_cell_rows_from_value(&a[1])?;
        Ok((origin, contents))
    }
}

impl FromParams for (methods::Rectangle, methods::BufferCell) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 2 {
            return Err(HostError::InvalidParameters);
        }
        let rectangle = methods::Rectangle::from_params(&a[0..1])?;
        let buffer_cell = methods::BufferCell::from_params(&a[1..2])?;
        Ok((rectangle, buffer_cell))
    }
}

impl FromParams for (methods::Rectangle,) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        let rectangle = methods::Rectangle::from_params(a)?;
        Ok((rectangle,))
    }
}

impl FromParams
    for (
        methods::Rectangle,
        methods::Coordinates,
        methods::Rectangle,
        methods::BufferCell,
    )
{
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 4 {
            return Err(HostError::InvalidParameters);
        }
        let source = methods::Rectangle::from_params(&a[0..1])?;
        let destination = methods::Coordinates::from_params(&a[1..2])?;
        let clip = methods::Rectangle::from_params(&a[2..3])?;
        let fill = methods::BufferCell::from_params(&a[3..4])?;
        Ok((source, destination, clip, fill))
    }
}

// BufferCell deserialization
impl FromParams for methods::BufferCell {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 1 {
            return Err(HostError::InvalidParameters);
        }
        
        match &a[0] {
            PsValue::Object(obj) => {
                let character = obj.extended_properties
                    .get("character")
                    .and_then(|prop| {
                        if let PsValue::Primitive(psrp_protocol::PsPrimitiveValue::Char(c)) = &prop.value {
                            Some(*c)
                        } else {
                            None
                        }
                    })
                    .ok_or(HostError::InvalidParameters)?;
                
                let foreground = obj.extended_properties
                    .get("foregroundColor")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                let background = obj.extended_properties
                    .get("backgroundColor")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                let flags = obj.extended_properties
                    .get("bufferCellType")
                    .and_then(|prop| prop.value.as_i32())
                    .ok_or(HostError::InvalidParameters)?;
                
                Ok(methods::BufferCell { character, foreground, background, flags })
            }
            _ => Err(HostError::InvalidParameters),
        }
    }
}

impl FromParams for (PsValue,) {
    fn from_params(a: &[PsValue]) -> Result<Self, HostError> {
        if a.len() != 1 {
            return Err(HostError::InvalidParameters);
        }
        Ok((a[0].clone(),))
    }
}
