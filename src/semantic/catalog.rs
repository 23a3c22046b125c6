use super::symbols::TypeKind;

/// Well-known framework types: namespace, metadata name, arity, kind.
const WELL_KNOWN: &[(&str, &str, usize, TypeKind)] = &[
    ("System", "Object", 0, TypeKind::Class),
    ("System", "String", 0, TypeKind::Class),
    ("System", "Exception", 0, TypeKind::Class),
    ("System", "ArgumentException", 0, TypeKind::Class),
    ("System", "ArgumentNullException", 0, TypeKind::Class),
    ("System", "ArgumentOutOfRangeException", 0, TypeKind::Class),
    ("System", "InvalidOperationException", 0, TypeKind::Class),
    ("System", "NotImplementedException", 0, TypeKind::Class),
    ("System", "NotSupportedException", 0, TypeKind::Class),
    ("System", "Type", 0, TypeKind::Class),
    ("System", "Uri", 0, TypeKind::Class),
    ("System", "Version", 0, TypeKind::Class),
    ("System", "Array", 0, TypeKind::Class),
    ("System", "Delegate", 0, TypeKind::Class),
    ("System", "Attribute", 0, TypeKind::Class),
    ("System", "EventArgs", 0, TypeKind::Class),
    ("System", "Random", 0, TypeKind::Class),
    ("System", "Console", 0, TypeKind::Class),
    ("System", "Math", 0, TypeKind::Class),
    ("System", "Environment", 0, TypeKind::Class),
    ("System", "StringComparer", 0, TypeKind::Class),
    ("System", "Lazy", 1, TypeKind::Class),
    ("System", "Tuple", 1, TypeKind::Class),
    ("System", "Tuple", 2, TypeKind::Class),
    ("System", "Tuple", 3, TypeKind::Class),
    ("System", "Action", 0, TypeKind::Delegate),
    ("System", "Action", 1, TypeKind::Delegate),
    ("System", "Action", 2, TypeKind::Delegate),
    ("System", "Action", 3, TypeKind::Delegate),
    ("System", "Func", 1, TypeKind::Delegate),
    ("System", "Func", 2, TypeKind::Delegate),
    ("System", "Func", 3, TypeKind::Delegate),
    ("System", "Func", 4, TypeKind::Delegate),
    ("System", "Predicate", 1, TypeKind::Delegate),
    ("System", "EventHandler", 0, TypeKind::Delegate),
    ("System", "EventHandler", 1, TypeKind::Delegate),
    ("System", "IDisposable", 0, TypeKind::Interface),
    ("System", "IComparable", 0, TypeKind::Interface),
    ("System", "IComparable", 1, TypeKind::Interface),
    ("System", "IEquatable", 1, TypeKind::Interface),
    ("System", "IFormatProvider", 0, TypeKind::Interface),
    ("System", "IServiceProvider", 0, TypeKind::Interface),
    ("System", "Boolean", 0, TypeKind::Struct),
    ("System", "Char", 0, TypeKind::Struct),
    ("System", "Byte", 0, TypeKind::Struct),
    ("System", "SByte", 0, TypeKind::Struct),
    ("System", "Int16", 0, TypeKind::Struct),
    ("System", "UInt16", 0, TypeKind::Struct),
    ("System", "Int32", 0, TypeKind::Struct),
    ("System", "UInt32", 0, TypeKind::Struct),
    ("System", "Int64", 0, TypeKind::Struct),
    ("System", "UInt64", 0, TypeKind::Struct),
    ("System", "IntPtr", 0, TypeKind::Struct),
    ("System", "UIntPtr", 0, TypeKind::Struct),
    ("System", "Single", 0, TypeKind::Struct),
    ("System", "Double", 0, TypeKind::Struct),
    ("System", "Decimal", 0, TypeKind::Struct),
    ("System", "Void", 0, TypeKind::Struct),
    ("System", "DateTime", 0, TypeKind::Struct),
    ("System", "DateTimeOffset", 0, TypeKind::Struct),
    ("System", "TimeSpan", 0, TypeKind::Struct),
    ("System", "Guid", 0, TypeKind::Struct),
    ("System", "Nullable", 1, TypeKind::Struct),
    ("System", "Span", 1, TypeKind::Struct),
    ("System", "ReadOnlySpan", 1, TypeKind::Struct),
    ("System", "Memory", 1, TypeKind::Struct),
    ("System", "ReadOnlyMemory", 1, TypeKind::Struct),
    ("System", "ValueTuple", 1, TypeKind::Struct),
    ("System", "ValueTuple", 2, TypeKind::Struct),
    ("System", "ValueTuple", 3, TypeKind::Struct),
    ("System", "StringComparison", 0, TypeKind::Enum),
    ("System", "DayOfWeek", 0, TypeKind::Enum),
    ("System.Collections", "IEnumerable", 0, TypeKind::Interface),
    ("System.Collections", "IEnumerator", 0, TypeKind::Interface),
    ("System.Collections", "ICollection", 0, TypeKind::Interface),
    ("System.Collections", "IList", 0, TypeKind::Interface),
    ("System.Collections", "IDictionary", 0, TypeKind::Interface),
    ("System.Collections", "ArrayList", 0, TypeKind::Class),
    ("System.Collections", "Hashtable", 0, TypeKind::Class),
    ("System.Collections.Generic", "List", 1, TypeKind::Class),
    ("System.Collections.Generic", "Dictionary", 2, TypeKind::Class),
    ("System.Collections.Generic", "HashSet", 1, TypeKind::Class),
    ("System.Collections.Generic", "SortedSet", 1, TypeKind::Class),
    ("System.Collections.Generic", "SortedDictionary", 2, TypeKind::Class),
    ("System.Collections.Generic", "Queue", 1, TypeKind::Class),
    ("System.Collections.Generic", "Stack", 1, TypeKind::Class),
    ("System.Collections.Generic", "LinkedList", 1, TypeKind::Class),
    ("System.Collections.Generic", "Comparer", 1, TypeKind::Class),
    ("System.Collections.Generic", "EqualityComparer", 1, TypeKind::Class),
    ("System.Collections.Generic", "IEnumerable", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IEnumerator", 1, TypeKind::Interface),
    ("System.Collections.Generic", "ICollection", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IList", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IReadOnlyCollection", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IReadOnlyList", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IDictionary", 2, TypeKind::Interface),
    ("System.Collections.Generic", "IReadOnlyDictionary", 2, TypeKind::Interface),
    ("System.Collections.Generic", "ISet", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IComparer", 1, TypeKind::Interface),
    ("System.Collections.Generic", "IEqualityComparer", 1, TypeKind::Interface),
    ("System.Collections.Generic", "KeyValuePair", 2, TypeKind::Struct),
    ("System.Collections.Immutable", "ImmutableArray", 1, TypeKind::Struct),
    ("System.Collections.Immutable", "ImmutableList", 1, TypeKind::Class),
    ("System.Collections.Immutable", "ImmutableDictionary", 2, TypeKind::Class),
    ("System.Collections.Immutable", "ImmutableHashSet", 1, TypeKind::Class),
    ("System.Collections.Immutable", "IImmutableList", 1, TypeKind::Interface),
    ("System.Collections.Concurrent", "ConcurrentDictionary", 2, TypeKind::Class),
    ("System.Collections.Concurrent", "ConcurrentQueue", 1, TypeKind::Class),
    ("System.Collections.Concurrent", "ConcurrentBag", 1, TypeKind::Class),
    ("System.Collections.ObjectModel", "Collection", 1, TypeKind::Class),
    ("System.Collections.ObjectModel", "ReadOnlyCollection", 1, TypeKind::Class),
    ("System.Collections.ObjectModel", "ObservableCollection", 1, TypeKind::Class),
    ("System.Threading", "CancellationToken", 0, TypeKind::Struct),
    ("System.Threading", "CancellationTokenSource", 0, TypeKind::Class),
    ("System.Threading", "Thread", 0, TypeKind::Class),
    ("System.Threading", "SemaphoreSlim", 0, TypeKind::Class),
    ("System.Threading.Tasks", "Task", 0, TypeKind::Class),
    ("System.Threading.Tasks", "Task", 1, TypeKind::Class),
    ("System.Threading.Tasks", "ValueTask", 0, TypeKind::Struct),
    ("System.Threading.Tasks", "ValueTask", 1, TypeKind::Struct),
    ("System.Threading.Tasks", "TaskCompletionSource", 1, TypeKind::Class),
    ("System.IO", "Stream", 0, TypeKind::Class),
    ("System.IO", "MemoryStream", 0, TypeKind::Class),
    ("System.IO", "FileStream", 0, TypeKind::Class),
    ("System.IO", "TextReader", 0, TypeKind::Class),
    ("System.IO", "TextWriter", 0, TypeKind::Class),
    ("System.IO", "StreamReader", 0, TypeKind::Class),
    ("System.IO", "StreamWriter", 0, TypeKind::Class),
    ("System.IO", "StringReader", 0, TypeKind::Class),
    ("System.IO", "StringWriter", 0, TypeKind::Class),
    ("System.IO", "BinaryReader", 0, TypeKind::Class),
    ("System.IO", "BinaryWriter", 0, TypeKind::Class),
    ("System.IO", "FileInfo", 0, TypeKind::Class),
    ("System.IO", "DirectoryInfo", 0, TypeKind::Class),
    ("System.IO", "File", 0, TypeKind::Class),
    ("System.IO", "Path", 0, TypeKind::Class),
    ("System.Text", "StringBuilder", 0, TypeKind::Class),
    ("System.Text", "Encoding", 0, TypeKind::Class),
    ("System.Text.RegularExpressions", "Regex", 0, TypeKind::Class),
    ("System.Text.RegularExpressions", "Match", 0, TypeKind::Class),
    ("System.Linq", "Enumerable", 0, TypeKind::Class),
    ("System.Linq", "IQueryable", 1, TypeKind::Interface),
    ("System.Linq", "IGrouping", 2, TypeKind::Interface),
    ("System.Linq", "ILookup", 2, TypeKind::Interface),
    ("System.Linq", "IOrderedEnumerable", 1, TypeKind::Interface),
    ("System.Linq.Expressions", "Expression", 0, TypeKind::Class),
    ("System.Linq.Expressions", "Expression", 1, TypeKind::Class),
    ("System.Diagnostics", "Debug", 0, TypeKind::Class),
    ("System.Diagnostics", "Stopwatch", 0, TypeKind::Class),
    ("System.Diagnostics", "Process", 0, TypeKind::Class),
    ("System.Diagnostics.Contracts", "Contract", 0, TypeKind::Class),
    ("System.Reflection", "Assembly", 0, TypeKind::Class),
    ("System.Reflection", "MemberInfo", 0, TypeKind::Class),
    ("System.Reflection", "MethodInfo", 0, TypeKind::Class),
    ("System.Reflection", "PropertyInfo", 0, TypeKind::Class),
    ("System.Reflection", "FieldInfo", 0, TypeKind::Class),
    ("System.Reflection", "ParameterInfo", 0, TypeKind::Class),
    ("System.Globalization", "CultureInfo", 0, TypeKind::Class),
    ("System.Net.Http", "HttpClient", 0, TypeKind::Class),
    ("System.Net.Http", "HttpResponseMessage", 0, TypeKind::Class),
];

/// Looks up a framework type by namespace, simple name and arity.
pub(crate) fn find(namespace: &str, name: &str, arity: usize) -> Option<TypeKind> {
    WELL_KNOWN
        .iter()
        .find(|(ns, n, a, _)| *ns == namespace && *n == name && *a == arity)
        .map(|(_, _, _, kind)| *kind)
}

/// Namespace and metadata name of a predefined type keyword.
pub(crate) fn predefined(keyword: &str) -> Option<(&'static str, TypeKind)> {
    let entry = match keyword {
        "object" => ("Object", TypeKind::Class),
        "string" => ("String", TypeKind::Class),
        "bool" => ("Boolean", TypeKind::Struct),
        "char" => ("Char", TypeKind::Struct),
        "byte" => ("Byte", TypeKind::Struct),
        "sbyte" => ("SByte", TypeKind::Struct),
        "short" => ("Int16", TypeKind::Struct),
        "ushort" => ("UInt16", TypeKind::Struct),
        "int" => ("Int32", TypeKind::Struct),
        "uint" => ("UInt32", TypeKind::Struct),
        "long" => ("Int64", TypeKind::Struct),
        "ulong" => ("UInt64", TypeKind::Struct),
        "nint" => ("IntPtr", TypeKind::Struct),
        "nuint" => ("UIntPtr", TypeKind::Struct),
        "float" => ("Single", TypeKind::Struct),
        "double" => ("Double", TypeKind::Struct),
        "decimal" => ("Decimal", TypeKind::Struct),
        "void" => ("Void", TypeKind::Struct),
        _ => return None,
    };
    Some(entry)
}
