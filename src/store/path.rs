use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Key(String),
	Index(usize),
}

/// Location inside the merged tree, rendered as `section.field` with list
/// elements as `section.arr[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath {
	segments: Vec<Segment>,
}

impl KeyPath {
	pub fn root() -> Self {
		Self::default()
	}

	pub fn is_root(&self) -> bool {
		self.segments.is_empty()
	}

	pub fn child(&self, key: &str) -> Self {
		let mut segments = self.segments.clone();
		segments.push(Segment::Key(key.to_string()));
		Self { segments }
	}

	pub fn index(&self, index: usize) -> Self {
		let mut segments = self.segments.clone();
		segments.push(Segment::Index(index));
		Self { segments }
	}
}

impl fmt::Display for KeyPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_root() {
			return f.write_str("<root>");
		}

		for (i, segment) in self.segments.iter().enumerate() {
			match segment {
				Segment::Key(key) if i == 0 => f.write_str(key)?,
				Segment::Key(key) => write!(f, ".{key}")?,
				Segment::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}
