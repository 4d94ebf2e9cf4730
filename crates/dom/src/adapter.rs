use crate::{Dom, DomError, NodeKey};
use fiber::{AdapterError, AdapterOp, DisplayAdapter};
use vdom::{AttrChange, Attributes, TEXT_TAG, TEXT_VALUE_KEY};

fn text_of(attributes: &Attributes) -> String {
    attributes
        .get(TEXT_VALUE_KEY)
        .map(ToString::to_string)
        .unwrap_or_default()
}

impl Dom {
    fn create_for(&mut self, tag: &str, attributes: &Attributes) -> Result<NodeKey, DomError> {
        self.check_fault(AdapterOp::CreateHandle)?;
        if tag == TEXT_TAG {
            return Ok(self.create_text(text_of(attributes)));
        }
        self.create_element(
            tag,
            attributes.iter().filter(|(key, _)| *key != TEXT_VALUE_KEY),
        )
    }

    fn update_for(
        &mut self,
        key: NodeKey,
        tag: &str,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), DomError> {
        self.check_fault(AdapterOp::UpdateAttributes)?;
        if tag == TEXT_TAG {
            let text = text_of(new);
            if self.text(key).ok_or(DomError::WrongNodeKind(key))? != text {
                self.set_text(key, &text)?;
            }
            return Ok(());
        }
        // Validate once up front so a bad handle leaves the node untouched.
        if self.tag(key).is_none() {
            return Err(DomError::WrongNodeKind(key));
        }
        for change in Attributes::diff(old, new) {
            match change {
                AttrChange::Remove { key: name } if name != TEXT_VALUE_KEY => {
                    self.remove_attribute(key, name)?;
                }
                AttrChange::Set { key: name, value } if name != TEXT_VALUE_KEY => {
                    self.set_attribute(key, name, value.to_string())?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl DisplayAdapter for Dom {
    type Handle = NodeKey;

    fn create_handle(&mut self, tag: &str, attributes: &Attributes) -> Result<NodeKey, AdapterError> {
        self.create_for(tag, attributes)
            .map_err(|err| err.into_adapter(AdapterOp::CreateHandle))
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), AdapterError> {
        self.check_fault(AdapterOp::AppendChild)
            .and_then(|()| Dom::append_child(self, parent, child))
            .map_err(|err| err.into_adapter(AdapterOp::AppendChild))
    }

    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<(), AdapterError> {
        self.check_fault(AdapterOp::RemoveChild)
            .and_then(|()| Dom::remove_child(self, parent, child))
            .map_err(|err| err.into_adapter(AdapterOp::RemoveChild))
    }

    fn update_attributes(
        &mut self,
        handle: NodeKey,
        tag: &str,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), AdapterError> {
        self.update_for(handle, tag, old, new)
            .map_err(|err| err.into_adapter(AdapterOp::UpdateAttributes))
    }
}
