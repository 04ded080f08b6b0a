//! Rewriting class names embedded in descriptors and generic signatures
//!
//! None of these functions validate their input: they only need to find class names. Anything
//! they don't recognize is copied through untouched.

use std::iter::Peekable;
use std::str::Chars;

/// Rewrite every class name in a field or method descriptor
///
/// ```
/// # use litecompat::jvm::map_descriptor;
/// let mapped = map_descriptor("(ILabc;[Labc;)Ldef;", &mut |name: &str| name.to_uppercase());
/// assert_eq!(mapped, "(ILABC;[LABC;)LDEF;");
/// ```
pub fn map_descriptor(descriptor: &str, map: &mut impl FnMut(&str) -> String) -> String {
    let mut mapped = String::with_capacity(descriptor.len());
    let mut chars = descriptor.chars();
    while let Some(c) = chars.next() {
        mapped.push(c);
        if c == 'L' {
            let name: String = chars.by_ref().take_while(|c| *c != ';').collect();
            mapped.push_str(&map(&name));
            mapped.push(';');
        }
    }
    mapped
}

/// Rewrite the name found in a `CONSTANT_Class_info`
///
/// These are usually internal names (`a/b/C`), except for array classes which use a field
/// descriptor (`[La/b/C;`).
pub fn map_class_constant(name: &str, map: &mut impl FnMut(&str) -> String) -> String {
    if name.starts_with('[') {
        map_descriptor(name, map)
    } else {
        map(name)
    }
}

/// Rewrite every class name in a class, method, or field generic signature
///
/// Inner classes of parameterized types (`La/Outer<TT;>.Inner;`) are mapped by their full
/// binary name (`a/Outer$Inner`) and written back using the mapped simple name.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9.1
pub fn map_signature(signature: &str, map: &mut impl FnMut(&str) -> String) -> String {
    let mut remapper = SignatureRemapper {
        chars: signature.chars().peekable(),
        mapped: String::with_capacity(signature.len()),
        map,
    };
    remapper.signature();
    remapper.mapped
}

struct SignatureRemapper<'a, F> {
    chars: Peekable<Chars<'a>>,
    mapped: String,
    map: &'a mut F,
}

impl<'a, F: FnMut(&str) -> String> SignatureRemapper<'a, F> {
    fn copy_next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.mapped.push(c);
        Some(c)
    }

    /// Read characters up to (but not including) any of the terminators
    fn identifier(&mut self, terminators: &[char]) -> String {
        let mut ident = String::new();
        while let Some(c) = self.chars.peek() {
            if terminators.contains(c) {
                break;
            }
            ident.push(*c);
            self.chars.next();
        }
        ident
    }

    fn signature(&mut self) {
        if self.chars.peek() == Some(&'<') {
            self.formal_type_parameters();
        }
        while let Some(c) = self.chars.peek() {
            match c {
                '(' | ')' | '^' | 'V' => {
                    self.copy_next();
                }
                _ => {
                    if !self.type_signature() {
                        break;
                    }
                }
            }
        }
        // Whatever is left is not something we understand
        self.mapped.extend(self.chars.by_ref());
    }

    fn formal_type_parameters(&mut self) {
        self.copy_next(); // '<'
        while let Some(c) = self.chars.peek() {
            match c {
                '>' => {
                    self.copy_next();
                    return;
                }
                ':' => {
                    self.copy_next();
                    // Class bound may be omitted (`T::Ljava/lang/Comparable;`)
                    if !matches!(self.chars.peek(), Some(':') | Some('>')) && !self.type_signature()
                    {
                        return;
                    }
                }
                _ => {
                    let ident = self.identifier(&[':', '>']);
                    self.mapped.push_str(&ident);
                }
            }
        }
    }

    /// Returns `false` if the input could not be understood
    fn type_signature(&mut self) -> bool {
        match self.chars.peek() {
            Some('B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z') => {
                self.copy_next();
                true
            }
            Some('[') => {
                self.copy_next();
                self.type_signature()
            }
            Some('T') => {
                self.copy_next();
                let ident = self.identifier(&[';']);
                self.mapped.push_str(&ident);
                self.copy_next().is_some()
            }
            Some('L') => {
                self.copy_next();
                self.class_type_signature()
            }
            _ => false,
        }
    }

    fn class_type_signature(&mut self) -> bool {
        let mut old_name = self.identifier(&['<', '.', ';']);
        let mut new_name = (self.map)(&old_name);
        self.mapped.push_str(&new_name);

        loop {
            match self.chars.peek() {
                Some('<') => {
                    if !self.type_arguments() {
                        return false;
                    }
                }
                Some('.') => {
                    self.copy_next();
                    let simple_name = self.identifier(&['<', '.', ';']);
                    old_name = format!("{}${}", old_name, simple_name);
                    let mapped_inner = (self.map)(&old_name);
                    let mapped_simple = match mapped_inner.strip_prefix(&format!("{}$", new_name))
                    {
                        Some(simple) => simple.to_owned(),
                        None => match mapped_inner.rfind('$') {
                            Some(idx) => mapped_inner[idx + 1..].to_owned(),
                            None => simple_name,
                        },
                    };
                    self.mapped.push_str(&mapped_simple);
                    new_name = mapped_inner;
                }
                Some(';') => {
                    self.copy_next();
                    return true;
                }
                _ => return false,
            }
        }
    }

    fn type_arguments(&mut self) -> bool {
        self.copy_next(); // '<'
        loop {
            match self.chars.peek() {
                Some('>') => {
                    self.copy_next();
                    return true;
                }
                Some('*') => {
                    self.copy_next();
                }
                Some('+' | '-') => {
                    self.copy_next();
                    if !self.type_signature() {
                        return false;
                    }
                }
                Some(_) => {
                    if !self.type_signature() {
                        return false;
                    }
                }
                None => return false,
            }
        }
    }
}
